//! Error types for the workspace

use editlog_history::CodecError;
use editlog_recorder::RecorderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("History error: {0}")]
    Codec(#[from] CodecError),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
