use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(String),
    #[error("history store lock poisoned")]
    Lock,
    #[error("history io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("history record is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("corrupt history record in {path} at line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}
