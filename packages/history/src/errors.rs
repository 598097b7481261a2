//! Error types for the history crate

use thiserror::Error;

/// Failure to persist or reload an operation history
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed operation history: {0}")]
    Malformed(String),

    #[error("Unsupported history version: {0}")]
    UnsupportedVersion(String),

    #[error("Unsupported history encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Refusing to write an empty operation history")]
    EmptyHistory,
}

/// Failure to apply an operation to a buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Mismatch at offset {offset}: expected {expected:?}, found {found:?}")]
    Mismatch {
        offset: usize,
        expected: String,
        found: String,
    },
}
