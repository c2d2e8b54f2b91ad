//! sheetsync CLI
//!
//! Command-line interface for the shared spreadsheet cache

use clap::{Parser, Subcommand, ValueEnum};
use sheetsync_core::logging_facility::{self, Profile};
use std::path::PathBuf;

mod commands;
mod report;

#[derive(Debug, Parser)]
#[command(name = "sheetsync")]
#[command(about = "sheetsync - spreadsheet snapshots shared through git", long_about = None)]
struct Cli {
    /// Dataset configuration file
    #[arg(long, global = true, default_value = "sheetsync.toml")]
    config: PathBuf,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Human,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh the shared cache, or wait for whoever is refreshing it
    Sync(commands::sync::SyncArgs),
    /// Look up one row by key
    Lookup(commands::lookup::LookupArgs),
    /// Look up the submitting student's row and write an autograder report
    Grade(commands::grade::GradeArgs),
}

fn main() {
    let cli = Cli::parse();

    logging_facility::init(match cli.log_format {
        LogFormat::Human => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let result = match cli.command {
        Commands::Sync(args) => commands::sync::execute(args, &cli.config),
        Commands::Lookup(args) => commands::lookup::execute(args, &cli.config),
        Commands::Grade(args) => commands::grade::execute(args, &cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
