//! # Recording Session
//!
//! Wires a [`Recorder`] to a [`HistoryManager`] and exposes the calls an
//! editor shell makes: open, activate, save and close a file, plus the raw
//! host notifications.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use editlog_common::now_millis;
use editlog_history::{FileAction, OperationHistory};
use editlog_recorder::{
    CommandExecution, CursorMove, DocumentSource, Recorder, RefactoringNotification,
    ResourceChange, TextChange, UndoNotification,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::WorkspaceResult;
use crate::history_manager::{HistoryManager, LoggingOperationListener, OperationListener};

pub struct RecordingSession {
    config: Config,
    recorder: Recorder,
    manager: Arc<HistoryManager>,
}

impl RecordingSession {
    /// Load the configuration found in `root` and start a session there
    pub fn open(root: &Path, source: Arc<dyn DocumentSource>) -> WorkspaceResult<Self> {
        let config = Config::load(root)?;
        Ok(Self::new(root, config, source))
    }

    pub fn new(root: &Path, config: Config, source: Arc<dyn DocumentSource>) -> Self {
        let manager = Arc::new(
            HistoryManager::new(config.history_dir(root))
                .with_author(config.author.clone())
                .with_diff_generator(config.diff_generator()),
        );

        let recorder = Recorder::new(source)
            .with_compressor(config.compressor())
            .with_diff_generator(config.diff_generator());
        recorder.add_listener(manager.clone());
        manager.add_listener(Arc::new(LoggingOperationListener));

        info!(history_dir = %manager.history_dir().display(), "recording session started");

        Self {
            config,
            recorder,
            manager,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn manager(&self) -> &Arc<HistoryManager> {
        &self.manager
    }

    pub fn history_dir(&self) -> PathBuf {
        self.manager.history_dir().to_path_buf()
    }

    pub fn add_operation_listener(&self, listener: Arc<dyn OperationListener>) {
        self.manager.add_listener(listener);
    }

    /// Operations recorded since the last flush
    pub fn pending_history(&self) -> OperationHistory {
        self.manager.history()
    }

    /// An editor opened `path` showing `code`
    pub fn open_file(&self, path: &str, code: &str) -> WorkspaceResult<()> {
        self.recorder.start_editor(path)?;
        self.manager.record_file_open(path, code, now_millis());
        Ok(())
    }

    /// The editor on `path` gained focus
    pub fn activate_file(&self, path: &str) -> bool {
        self.manager.record_activation(path, now_millis())
    }

    /// The editor on `path` saved `code`; flushes the session history
    pub fn save_file(
        &self,
        path: &str,
        code: &str,
        encoding: Option<&str>,
    ) -> WorkspaceResult<Option<PathBuf>> {
        self.recorder.break_macro();
        self.manager
            .record_file_operation(path, code, FileAction::Save, true, now_millis());
        self.manager.write_history(encoding)
    }

    /// The editor on `path` closed showing `code`; flushes the session history
    pub fn close_file(
        &self,
        path: &str,
        code: &str,
        encoding: Option<&str>,
    ) -> WorkspaceResult<Option<PathBuf>> {
        if let Err(err) = self.recorder.detach_editor(path) {
            warn!(path, error = %err, "could not keep recording closed file");
        }
        self.manager.record_file_close(path, code, now_millis());
        self.manager.write_history(encoding)
    }

    pub fn text_changed(&self, change: TextChange) {
        self.recorder.text_changed(change);
    }

    pub fn undo_notification(&self, notification: UndoNotification) {
        self.recorder.undo_notification(notification);
    }

    pub fn command_executed(&self, command: CommandExecution) {
        self.recorder.command_executed(command);
    }

    pub fn refactoring(&self, notification: RefactoringNotification) {
        self.recorder.refactoring(notification);
    }

    pub fn resource_changed(&self, change: ResourceChange) {
        self.recorder.resource_changed(change);
    }

    pub fn cursor_moved(&self, cursor: CursorMove) {
        self.recorder.cursor_moved(cursor);
    }

    pub fn break_macro(&self) {
        self.recorder.break_macro();
    }

    /// Stop every stream and flush what is left
    pub fn stop(&self) -> WorkspaceResult<Option<PathBuf>> {
        self.recorder.stop();
        self.manager.write_history(None)
    }
}
