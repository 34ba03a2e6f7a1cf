//! Crate error type
//!
//! Expected branching (corner checks, sequence exhaustion, empty candidate
//! sets) is ordinary control flow and never produces an `Error`.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logger init failed: {0}")]
    Logger(#[from] log::SetLoggerError),
}
