//! # Editlog Recorder
//!
//! Turns the raw stream of host editing notifications into a compact,
//! ordered sequence of macros.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: text changes, undo, commands, ...     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ recorder: routes by path, global breaks     │
//! │  - registry: one stream per file            │
//! │  - menu assembler for file-less commands    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ stream: per-file state machine              │
//! │  - compressor: fuse keystrokes              │
//! │  - assembler: BEGIN/END compounds           │
//! │  - diff: reconcile with the host buffer     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ listeners: raw and finalized macros         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use editlog_recorder::{Recorder, TextChange};
//!
//! let recorder = Recorder::new(buffers);
//! recorder.add_listener(history_manager);
//! recorder.start_editor("/src/Main.java")?;
//!
//! recorder.text_changed(TextChange {
//!     path: "/src/Main.java".into(),
//!     offset: 0,
//!     inserted: "a".into(),
//!     deleted: String::new(),
//!     time: now_millis(),
//! });
//! recorder.break_macro();
//! ```

mod assembler;
mod compressor;
mod diff;
mod errors;
mod events;
mod macros;
mod recorder;
mod registry;
mod stream;

pub use assembler::{Assembled, CompoundAssembler};
pub use compressor::{MacroCompressor, DEFAULT_DELIMITERS};
pub use diff::{DiffMacroGenerator, DEFAULT_DIFF_TIMEOUT, DEFAULT_EDIT_COST};
pub use errors::RecorderError;
pub use events::{
    commands, CommandExecution, CursorMove, RefactoringNotification, RefactoringPhase,
    ResourceChange, Selection, TextChange, UndoNotification, UndoPhase,
};
pub use macros::{
    CompoundMacro, CopyMacro, DocumentMacro, EditType, ExecutionMacro, Macro, MacroShape,
    ResourceMacro, TriggerKind, TriggerMacro, CURSOR_CHANGE_LABEL,
};
pub use recorder::{DocumentSource, MacroListener, Recorder, REFACTORING_LABEL};
pub use registry::{SharedStream, StreamRegistry};
pub use stream::{DocStream, Emission, StreamMode, DIFF_LABEL};
