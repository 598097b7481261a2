//! # History Manager
//!
//! Turns finalized macros into operations, records the file lifecycle
//! around them and flushes the session history to disk.
//!
//! The manager remembers two file operations between calls:
//!
//! - the last NEW, so that the following open can be recorded as an empty
//!   file plus one insertion of its whole contents
//! - the last CLOSE, so that a delete right after it can record the text
//!   the file lost
//!
//! Storing any other operation forgets both.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use editlog_common::{now_millis, Timestamp};
use editlog_history::{
    write_history, CompoundOperation, CopyOperation, EditAction, FileAction, FileOperation,
    MenuOperation, NormalOperation, Operation, OperationHistory, ResourceTarget,
};
use editlog_recorder::{
    DiffMacroGenerator, DocumentMacro, EditType, Macro, MacroListener, ResourceMacro, DIFF_LABEL,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::errors::WorkspaceResult;

/// Receives every operation right after it is stored
pub trait OperationListener: Send + Sync {
    fn operation_added(&self, op: &Operation);
}

/// Logs each stored operation
#[derive(Debug, Default)]
pub struct LoggingOperationListener;

impl OperationListener for LoggingOperationListener {
    fn operation_added(&self, op: &Operation) {
        debug!(seq = op.seq(), path = op.path(), "{}", op);
    }
}

#[derive(Debug, Default)]
struct ManagerState {
    history: OperationHistory,
    new_operation: Option<FileOperation>,
    close_operation: Option<FileOperation>,
}

pub struct HistoryManager {
    state: Mutex<ManagerState>,
    listeners: RwLock<Vec<Arc<dyn OperationListener>>>,
    history_dir: PathBuf,
    author: Option<String>,
    generator: DiffMacroGenerator,
}

impl HistoryManager {
    pub fn new(history_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(ManagerState::default()),
            listeners: RwLock::new(Vec::new()),
            history_dir: history_dir.into(),
            author: None,
            generator: DiffMacroGenerator::default(),
        }
    }

    /// Record `author` instead of the current user
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    pub fn with_diff_generator(mut self, generator: DiffMacroGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    pub fn add_listener(&self, listener: Arc<dyn OperationListener>) {
        self.listeners.write().push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn OperationListener>) {
        self.listeners
            .write()
            .retain(|existing| !Arc::ptr_eq(existing, listener));
    }

    /// Copy of the history recorded since the last flush
    pub fn history(&self) -> OperationHistory {
        self.state.lock().history.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().history.is_empty()
    }

    pub fn last_operation(&self) -> Option<Operation> {
        self.state.lock().history.last().cloned()
    }

    /// An editor opened `path` with contents `code`
    pub fn record_file_open(&self, path: &str, code: &str, time: Timestamp) {
        let mut stored = Vec::new();
        {
            let mut state = self.state.lock();
            let created = state
                .new_operation
                .as_ref()
                .is_some_and(|op| op.path == path);

            if created {
                // A file created in this session starts out empty
                let open = FileOperation::new(time, path, FileAction::Open, Some(String::new()));
                stored.push(self.store(&mut state, open.into()));
                if !code.is_empty() {
                    let insert = NormalOperation::new(time, path, 0, code, "", EditAction::Edit);
                    stored.push(self.store(&mut state, insert.into()));
                }
            } else {
                let open = FileOperation::new(time, path, FileAction::Open, Some(code.to_string()));
                stored.push(self.store(&mut state, open.into()));
            }

            state.new_operation = None;
            state.close_operation = None;
        }
        self.notify(&stored);
    }

    /// The editor on `path` closed with contents `code`
    pub fn record_file_close(&self, path: &str, code: &str, time: Timestamp) {
        let close = FileOperation::new(time, path, FileAction::Close, Some(code.to_string()));
        let stored = {
            let mut state = self.state.lock();
            let stored = self.store(&mut state, close.clone().into());
            state.new_operation = None;
            state.close_operation = Some(close);
            stored
        };
        self.notify(&[stored]);
    }

    /// Record SAVE, ACT, INSTANT or another file action. The snapshot is kept
    /// only when `write_code` is set.
    pub fn record_file_operation(
        &self,
        path: &str,
        code: &str,
        action: FileAction,
        write_code: bool,
        time: Timestamp,
    ) {
        let code = write_code.then(|| code.to_string());
        self.store_and_notify(vec![FileOperation::new(time, path, action, code).into()]);
    }

    /// Record an ACT for `path` unless the previous operation already is one.
    /// Returns whether anything was recorded.
    pub fn record_activation(&self, path: &str, time: Timestamp) -> bool {
        let repeated = matches!(
            self.state.lock().history.last(),
            Some(Operation::File(op)) if op.action == FileAction::Act && op.path == path
        );
        if repeated {
            debug!(path, "skipped repeated activation");
            return false;
        }

        self.record_file_operation(path, "", FileAction::Act, false, time);
        true
    }

    /// Persist the history recorded so far as `<history dir>/<millis>.json`.
    ///
    /// Returns `None` when there is nothing worth writing. The history is
    /// cleared only after a successful write.
    pub fn write_history(&self, encoding: Option<&str>) -> WorkspaceResult<Option<PathBuf>> {
        let mut state = self.state.lock();

        if state.history.is_empty() {
            return Ok(None);
        }
        if !state.history.should_write() {
            debug!(operations = state.history.len(), "dropped trivial history");
            state.history.clear();
            return Ok(None);
        }

        if let Some(encoding) = encoding {
            if !encoding.eq_ignore_ascii_case(editlog_history::HISTORY_ENCODING) {
                warn!(encoding, "history is always written as UTF-8");
            }
        }

        state.history.sort();
        let path = self.next_history_file();

        match write_history(&state.history, &path) {
            Ok(()) => {
                info!(
                    path = %path.display(),
                    operations = state.history.len(),
                    "wrote history"
                );
                state.history.clear();
                Ok(Some(path))
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to write history");
                Err(err.into())
            }
        }
    }

    fn next_history_file(&self) -> PathBuf {
        let mut millis = now_millis();
        loop {
            let path = self.history_dir.join(format!("{}.json", millis));
            if !path.exists() {
                return path;
            }
            millis += 1;
        }
    }

    fn store(&self, state: &mut ManagerState, mut op: Operation) -> Operation {
        if let Some(author) = &self.author {
            op.set_author(author.clone());
        }
        state.history.append(op.clone());
        // The appended copy carries the assigned sequence number
        state.history.last().cloned().unwrap_or(op)
    }

    fn store_and_notify(&self, ops: Vec<Operation>) {
        let stored: Vec<Operation> = {
            let mut state = self.state.lock();
            let stored = ops
                .into_iter()
                .map(|op| self.store(&mut state, op))
                .collect();
            state.new_operation = None;
            state.close_operation = None;
            stored
        };
        self.notify(&stored);
    }

    fn notify(&self, ops: &[Operation]) {
        let listeners = self.listeners.read().clone();
        for op in ops {
            for listener in &listeners {
                listener.operation_added(op);
            }
        }
    }

    fn resource_changed(&self, m: &ResourceMacro) {
        if m.target != ResourceTarget::File {
            return;
        }

        if m.action.is_addition() {
            let created = FileOperation::new(m.time, &m.path, FileAction::New, Some(String::new()));
            let stored = {
                let mut state = self.state.lock();
                let stored = self.store(&mut state, created.clone().into());
                state.new_operation = Some(created);
                state.close_operation = None;
                stored
            };
            self.notify(&[stored]);
        } else if m.action.is_removal() {
            self.file_removed(m);
        }
    }

    fn file_removed(&self, m: &ResourceMacro) {
        let mut stored = Vec::new();
        {
            let mut state = self.state.lock();

            if let Some(close) = state.close_operation.take() {
                let closed_code = close.code.unwrap_or_default();
                let ops: Vec<Operation> = self
                    .generator
                    .generate(m.time, &m.path, &closed_code, "")
                    .iter()
                    .map(|dm| to_normal_operation(dm).into())
                    .collect();
                if !ops.is_empty() {
                    let diff = CompoundOperation::new(m.time, DIFF_LABEL, ops);
                    stored.push(self.store(&mut state, diff.into()));
                }
            }

            let delete = FileOperation::new(m.time, &m.path, FileAction::Delete, m.code.clone());
            stored.push(self.store(&mut state, delete.into()));
            state.new_operation = None;
        }
        self.notify(&stored);

        if let Err(err) = self.write_history(m.encoding.as_deref()) {
            warn!(path = %m.path, error = %err, "failed to flush history after delete");
        }
    }
}

impl MacroListener for HistoryManager {
    fn macro_added(&self, m: &Macro) {
        if let Macro::Resource(resource) = m {
            self.resource_changed(resource);
            return;
        }

        match to_operation(m) {
            Some(op) => self.store_and_notify(vec![op]),
            None => debug!(path = m.path(), "macro has no operation"),
        }
    }
}

/// The operation a finalized macro is stored as
pub fn to_operation(m: &Macro) -> Option<Operation> {
    match m {
        Macro::Document(dm) => Some(to_normal_operation(dm).into()),
        Macro::Copy(copy) => {
            Some(CopyOperation::new(copy.time, &copy.path, copy.offset, &copy.copied).into())
        }
        Macro::Execution(exec) => {
            Some(MenuOperation::new(exec.time, &exec.path, &exec.command_id).into())
        }
        Macro::Compound(compound) => {
            let ops: Vec<Operation> = compound
                .document_macros()
                .map(|dm| to_normal_operation(dm).into())
                .collect();
            if ops.is_empty() {
                return None;
            }
            Some(CompoundOperation::new(compound.start_time, &compound.label, ops).into())
        }
        Macro::Cancel(_) | Macro::Trigger(_) | Macro::Resource(_) => None,
    }
}

fn to_normal_operation(dm: &DocumentMacro) -> NormalOperation {
    NormalOperation::new(
        dm.start_time,
        &dm.path,
        dm.offset,
        &dm.inserted,
        &dm.deleted,
        edit_action(dm.kind),
    )
}

fn edit_action(kind: EditType) -> EditAction {
    match kind {
        EditType::Typing => EditAction::Edit,
        EditType::Cut => EditAction::Cut,
        EditType::Paste => EditAction::Paste,
        EditType::Undo => EditAction::Undo,
        EditType::Redo => EditAction::Redo,
        EditType::Diff => EditAction::Diff,
    }
}
