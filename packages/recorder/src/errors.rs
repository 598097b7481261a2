//! Error types for the recorder

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("No buffer available for {0}")]
    DocumentUnavailable(String),
}
