//! Error handling for sheetsync-store
//!
//! Wraps sheetsync-core ExError with store-specific helpers

use sheetsync_core::errors::{ExError, ExErrorKind, SheetSyncError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: &std::io::Error) -> ExError {
    SheetSyncError::io(operation, err).into()
}

/// Create a git command failure
pub fn git_failure(args: &[&str], status: &std::process::ExitStatus, stderr: &[u8]) -> ExError {
    SheetSyncError::GitCommand {
        args: args.join(" "),
        status: status.to_string(),
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    }
    .into()
}

/// Create a table-file codec error
pub fn table_error(sheet: &str, reason: impl std::fmt::Display) -> ExError {
    SheetSyncError::Table {
        sheet: sheet.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Create an error for a store invariant that did not hold
pub fn store_invariant(op: &str, message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op)
        .with_message(message)
}
