//! Shared building blocks for the editlog crates: the common error type,
//! wall-clock timestamps, author identity and char-offset text helpers.

pub mod author;
pub mod error;
pub mod result;
pub mod text;
pub mod time;

pub use author::*;
pub use error::*;
pub use result::*;
pub use text::*;
pub use time::*;
