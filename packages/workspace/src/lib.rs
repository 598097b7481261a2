//! # Editlog Workspace
//!
//! Session-level recording: configuration, conversion of finalized macros
//! into stored operations, and the persisted history directory.
//!
//! ```text
//! ┌──────────────┐  macros   ┌────────────────┐  flush   ┌──────────────┐
//! │   Recorder   │──────────▶│ HistoryManager │─────────▶│ <millis>.json│
//! └──────────────┘           └────────────────┘          └──────┬───────┘
//!        ▲                            ▲                          │
//!        │        RecordingSession    │                          ▼
//!        └────── open / save / close ─┘                   ┌──────────────┐
//!                                                         │ HistoryStore │
//!                                                         └──────────────┘
//! ```

pub mod config;
pub mod errors;
pub mod history_manager;
pub mod session;
pub mod store;

pub use config::{Config, DEFAULT_CONFIG_NAME};
pub use errors::{WorkspaceError, WorkspaceResult};
pub use history_manager::{
    to_operation, HistoryManager, LoggingOperationListener, OperationListener,
};
pub use session::RecordingSession;
pub use store::{HistoryFile, HistoryStore};
