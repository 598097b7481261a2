//! # Editlog History
//!
//! Finalized editing operations, the ordered history that holds them, its
//! persisted document format and the replay engine that reconstructs file
//! snapshots from it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ operation: closed sum type of finalized ops │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ history: ordered, mergeable, filterable     │
//! │  - (time, seq) strict total order           │
//! │  - trivial open/close session detection     │
//! └─────────────────────────────────────────────┘
//!          ↓                          ↓
//! ┌──────────────────────┐   ┌──────────────────────┐
//! │ codec: JSON document │   │ restorer: replay ops │
//! └──────────────────────┘   └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use editlog_history::{apply_operation, read_history};
//!
//! let history = read_history(Path::new("history/1400000000000.json"))?;
//! let mut code = String::new();
//! for op in history.filter_by_path("/src/Main.java").iter() {
//!     code = apply_operation(&code, op)?;
//! }
//! ```

mod codec;
mod errors;
mod history;
mod operation;
mod restorer;

pub use codec::{
    from_document_str, read_history, to_document_string, write_history, HISTORY_ENCODING,
    HISTORY_VERSION,
};
pub use errors::{CodecError, ReplayError};
pub use history::OperationHistory;
pub use operation::{
    CompoundOperation, CopyOperation, EditAction, FileAction, FileOperation, MenuOperation,
    NormalOperation, Operation, OperationKind, ResourceAction, ResourceOperation, ResourceTarget,
};
pub use restorer::{
    apply_operation, apply_operation_reversely, replay, replay_reversely, restore_at,
};
