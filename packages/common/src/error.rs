use thiserror::Error;

/// Common error type shared by the editlog crates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("Offset {offset} is out of range for text of {len} chars")]
    OffsetOutOfRange { offset: usize, len: usize },
}
