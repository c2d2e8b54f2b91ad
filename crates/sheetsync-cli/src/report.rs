//! Autograder results file
//!
//! Free-form output plus named sections, serialized to the results JSON the
//! grading frontend renders.

use serde::Serialize;
use sheetsync_core::{ErrorClass, ExError};
use std::fs;
use std::path::Path;

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please contact course staff.";
const VISIBLE_ERROR_PREFIX: &str = "An error occurred. Details:";
const VISIBILITY: &str = "after_published";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    pub output: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GradeResults {
    pub score: u32,
    pub visibility: &'static str,
    pub stdout_visibility: &'static str,
    pub output: String,
    pub tests: Vec<TestResult>,
}

/// Collects report lines; sections keep first-use order
#[derive(Debug, Default)]
pub struct Messenger {
    output: Vec<String>,
    sections: Vec<(String, Vec<String>)>,
}

impl Messenger {
    pub fn log(&mut self, message: impl Into<String>) {
        self.output.push(message.into());
    }

    pub fn log_section(&mut self, section: &str, message: impl Into<String>) {
        let message = message.into();
        match self.sections.iter_mut().find(|(name, _)| name == section) {
            Some((_, lines)) => lines.push(message),
            None => self.sections.push((section.to_string(), vec![message])),
        }
    }

    pub fn reset(&mut self) {
        self.output.clear();
        self.sections.clear();
    }

    pub fn to_results(&self) -> GradeResults {
        GradeResults {
            score: 1,
            visibility: VISIBILITY,
            stdout_visibility: VISIBILITY,
            output: self.output.join("\n"),
            tests: self
                .sections
                .iter()
                .map(|(name, lines)| TestResult {
                    name: name.clone(),
                    output: lines.join("\n"),
                })
                .collect(),
        }
    }
}

/// What the student sees for a failed report
pub fn error_message(err: &ExError) -> String {
    match err.class() {
        ErrorClass::Visible => format!("{VISIBLE_ERROR_PREFIX}\n\n{}", err.message()),
        ErrorClass::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
    }
}

pub fn write_results(path: &Path, results: &GradeResults) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string(results)?)
}

/// Two-column grid of label and value
pub fn render_table(rows: &[(String, String)]) -> String {
    let width = |s: &str| s.chars().count();
    let label_width = rows.iter().map(|(l, _)| width(l)).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| width(v)).max().unwrap_or(0);
    let rule = format!("+{}+{}+", "-".repeat(label_width + 2), "-".repeat(value_width + 2));

    let mut lines = vec![rule.clone()];
    for (label, value) in rows {
        lines.push(format!(
            "| {}{} | {}{} |",
            label,
            " ".repeat(label_width - width(label)),
            value,
            " ".repeat(value_width - width(value)),
        ));
        lines.push(rule.clone());
    }
    lines.join("\n")
}
