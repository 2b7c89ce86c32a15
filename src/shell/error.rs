use std::io;

use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::btree::BTreeError;

/// Result type for shell operations
pub type ShellResult<T> = Result<T, ShellError>;

/// Errors that can occur while running shell commands
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("B-tree error: {0}")]
    BTree(#[from] BTreeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Readline error: {0}")]
    Readline(#[from] ReadlineError),

    #[error("Parse errors: {0}")]
    Parse(String),
}
