//! # Recorder
//!
//! Entry point for host notifications. Routes each one to the stream of the
//! file it concerns, or to the session-level (menu) assembler when no stream
//! exists, and delivers what comes out to the registered listeners.
//!
//! ## Breaks
//!
//! Commands, triggers and resource changes cut across files, so each of
//! them first flushes every stream: pending compressed macros are recorded
//! and buffers are reconciled against the host. Open compounds stay open
//! until END, a cursor move, [`Recorder::break_macro`] or [`Recorder::stop`],
//! so a refactoring started by a command spans the edits that follow it.
//!
//! ## Locking
//!
//! Listeners are called after all stream locks are released, so a listener
//! may call back into the recorder.

use std::sync::Arc;

use editlog_common::{now_millis, Timestamp};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::assembler::{Assembled, CompoundAssembler};
use crate::compressor::MacroCompressor;
use crate::diff::DiffMacroGenerator;
use crate::errors::RecorderError;
use crate::events::{
    CommandExecution, CursorMove, RefactoringNotification, RefactoringPhase, ResourceChange,
    TextChange, UndoNotification,
};
use crate::macros::{ExecutionMacro, Macro, ResourceMacro, TriggerMacro};
use crate::registry::{SharedStream, StreamRegistry};
use crate::stream::{DocStream, Emission, StreamMode};

pub const REFACTORING_LABEL: &str = "Refactoring";

/// Receives macros as the recorder produces them
pub trait MacroListener: Send + Sync {
    /// A finalized macro (a single edit, a command, a compound...)
    fn macro_added(&self, m: &Macro);

    /// Every macro as first observed, before compression and grouping
    fn raw_macro_added(&self, _m: &Macro) {}
}

/// Current contents of host buffers
pub trait DocumentSource: Send + Sync {
    fn current_text(&self, path: &str) -> Option<String>;
}

/// Session-level state shared by all streams
#[derive(Debug, Default)]
struct MenuState {
    assembler: CompoundAssembler,
    /// The refactoring command currently in progress
    parent: Option<ExecutionMacro>,
}

pub struct Recorder {
    registry: StreamRegistry,
    menu: Mutex<MenuState>,
    listeners: RwLock<Vec<Arc<dyn MacroListener>>>,
    source: Arc<dyn DocumentSource>,
    compressor: Option<MacroCompressor>,
    generator: DiffMacroGenerator,
}

impl Recorder {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            registry: StreamRegistry::new(),
            menu: Mutex::new(MenuState::default()),
            listeners: RwLock::new(Vec::new()),
            source,
            compressor: Some(MacroCompressor::default()),
            generator: DiffMacroGenerator::default(),
        }
    }

    /// Compressor for editor streams; `None` records every keystroke
    pub fn with_compressor(mut self, compressor: Option<MacroCompressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_diff_generator(mut self, generator: DiffMacroGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn add_listener(&self, listener: Arc<dyn MacroListener>) {
        self.listeners.write().push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn MacroListener>) {
        self.listeners
            .write()
            .retain(|existing| !Arc::ptr_eq(existing, listener));
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn stream_mode(&self, path: &str) -> Option<StreamMode> {
        self.registry.get(path).map(|stream| stream.lock().mode())
    }

    /// Start recording `path` in `mode`, replacing any existing stream
    pub fn start_stream(&self, path: &str, mode: StreamMode) -> Result<(), RecorderError> {
        let code = self
            .source
            .current_text(path)
            .ok_or_else(|| RecorderError::DocumentUnavailable(path.to_string()))?;

        let stream = DocStream::new(path, mode, code, self.compressor.clone());
        let mut out = Vec::new();
        if let Some(old) = self.registry.insert(stream) {
            self.stop_stream(&old, now_millis(), &mut out);
        }

        info!(path, mode = ?mode, "started recording");
        self.dispatch(out);
        Ok(())
    }

    /// An editor opened `path`
    pub fn start_editor(&self, path: &str) -> Result<(), RecorderError> {
        self.start_stream(path, StreamMode::Editor)
    }

    /// Record `path` in the background unless a stream already exists
    pub fn start_background(&self, path: &str) -> Result<(), RecorderError> {
        let code = self
            .source
            .current_text(path)
            .ok_or_else(|| RecorderError::DocumentUnavailable(path.to_string()))?;

        let (_, created) = self.registry.get_or_insert_with(path, || {
            DocStream::new(path, StreamMode::Background, code, None)
        });
        if created {
            debug!(path, "started background recording");
        }
        Ok(())
    }

    /// The editor on `path` closed: flush its stream and keep recording in
    /// the background
    pub fn detach_editor(&self, path: &str) -> Result<(), RecorderError> {
        let old = match self.registry.remove(path) {
            Some(old) => old,
            None => return Ok(()),
        };

        let mut out = Vec::new();
        self.stop_stream(&old, now_millis(), &mut out);
        self.dispatch(out);

        self.start_stream(path, StreamMode::Background)
    }

    /// Flush and drop every stream
    pub fn stop(&self) {
        let time = now_millis();
        let mut out = Vec::new();
        for stream in self.registry.drain() {
            self.stop_stream(&stream, time, &mut out);
        }
        self.close_menu_group(&mut out);
        self.menu.lock().parent = None;

        info!("stopped recording");
        self.dispatch(out);
    }

    fn stop_stream(&self, stream: &SharedStream, time: Timestamp, out: &mut Vec<Emission>) {
        let mut stream = stream.lock();
        let current = self.source.current_text(stream.path());
        stream.stop(current, time, &self.generator, out);
    }

    pub fn text_changed(&self, change: TextChange) {
        let stream = match self.registry.get(&change.path) {
            Some(stream) => stream,
            None => {
                debug!(path = %change.path, "text change for unrecorded file");
                return;
            }
        };

        let has_parent = self.has_parent();
        let mut out = Vec::new();
        stream.lock().text_changed(change, has_parent, &mut out);
        self.dispatch(out);
    }

    pub fn undo_notification(&self, notification: UndoNotification) {
        let stream = match self.registry.get(&notification.path) {
            Some(stream) => stream,
            None => return,
        };

        let has_parent = self.has_parent();
        let mut out = Vec::new();
        stream.lock().undo_notification(
            notification.phase,
            has_parent,
            notification.time,
            &mut out,
        );
        self.dispatch(out);
    }

    /// A command is about to execute
    pub fn command_executed(&self, command: CommandExecution) {
        let path = command.path.clone().unwrap_or_default();
        let exec = ExecutionMacro {
            time: command.time,
            path: path.clone(),
            command_id: command.command_id.clone(),
            label: "Exec".to_string(),
        };

        let mut out = Vec::new();
        self.flush_all(command.time, &mut out);
        match self.registry.get(&path) {
            Some(stream) => {
                stream
                    .lock()
                    .record_execution(exec.clone(), command.selection.clone(), &mut out)
            }
            None => self.record_menu(Macro::Execution(exec.clone()), &mut out),
        }
        self.dispatch(out);

        if command.is_refactoring() {
            debug!(command = %command.command_id, "refactoring command");
            self.menu.lock().parent = Some(exec);
            self.record_trigger(TriggerMacro::begin(command.time, REFACTORING_LABEL, path));
        }
    }

    /// Refactoring lifecycle. The refactoring is attributed to the file of
    /// the command that started it.
    pub fn refactoring(&self, notification: RefactoringNotification) {
        let path = self
            .menu
            .lock()
            .parent
            .as_ref()
            .map(|parent| parent.path.clone())
            .unwrap_or_default();

        match notification.phase {
            RefactoringPhase::AboutToPerform => self.record_trigger(TriggerMacro::begin(
                notification.time,
                notification.description,
                path,
            )),
            RefactoringPhase::Performed => {
                self.record_trigger(TriggerMacro::end(
                    notification.time,
                    notification.description,
                    path,
                ));
                self.menu.lock().parent = None;
            }
        }
    }

    /// A workspace resource changed. Removing a file ends its stream.
    pub fn resource_changed(&self, change: ResourceChange) {
        let resource = ResourceMacro {
            time: change.time,
            path: change.path.clone(),
            action: change.kind,
            target: change.target,
            identical_path: change.identical_path,
            code: change.code,
            encoding: change.encoding,
        };

        let mut out = Vec::new();
        self.flush_all(change.time, &mut out);
        match self.registry.get(&change.path) {
            Some(stream) => {
                stream.lock().record_resource(resource, &mut out);
                if change.kind.is_removal() {
                    debug!(path = %change.path, "file removed, dropping stream");
                    self.registry.remove(&change.path);
                }
            }
            None => self.record_menu(Macro::Resource(resource), &mut out),
        }
        self.dispatch(out);
    }

    /// The caret moved in an editor: closes any grouping and ends the
    /// current refactoring
    pub fn cursor_moved(&self, cursor: CursorMove) {
        let mut out = Vec::new();
        match self.registry.get(&cursor.path) {
            Some(stream) => stream.lock().cursor_moved(cursor.time, &mut out),
            None => self.record_menu(
                Macro::Trigger(TriggerMacro::cursor_change(cursor.time, cursor.path)),
                &mut out,
            ),
        }
        self.menu.lock().parent = None;
        self.dispatch(out);
    }

    fn record_trigger(&self, trigger: TriggerMacro) {
        let mut out = Vec::new();
        self.flush_all(trigger.time, &mut out);
        match self.registry.get(&trigger.path) {
            Some(stream) => stream.lock().record_trigger(trigger, &mut out),
            None => self.record_menu(Macro::Trigger(trigger), &mut out),
        }
        self.dispatch(out);
    }

    fn record_menu(&self, m: Macro, out: &mut Vec<Emission>) {
        out.push(Emission::Raw(m.clone()));
        if let Assembled::Finalized(m) = self.menu.lock().assembler.record(m) {
            out.push(Emission::Finalized(m));
        }
    }

    fn close_menu_group(&self, out: &mut Vec<Emission>) {
        if let Assembled::Finalized(m) = self.menu.lock().assembler.close() {
            out.push(Emission::Finalized(m));
        }
    }

    fn has_parent(&self) -> bool {
        self.menu.lock().parent.is_some()
    }

    /// Flush every stream, reconcile it with its buffer and close all open
    /// groupings
    pub fn break_macro(&self) {
        let time = now_millis();
        let mut out = Vec::new();
        for stream in self.registry.snapshot() {
            let mut stream = stream.lock();
            let current = self.source.current_text(stream.path());
            stream.break_macro(current, time, &self.generator, &mut out);
        }
        self.close_menu_group(&mut out);
        self.dispatch(out);
    }

    fn flush_all(&self, time: Timestamp, out: &mut Vec<Emission>) {
        for stream in self.registry.snapshot() {
            let mut stream = stream.lock();
            let current = self.source.current_text(stream.path());
            stream.flush(current, time, &self.generator, out);
        }
    }

    /// Record pending compressed macros of one file, or of all files
    pub fn dump_remaining(&self, path: Option<&str>) {
        let streams = match path {
            Some(path) => self.registry.get(path).into_iter().collect(),
            None => self.registry.snapshot(),
        };

        let mut out = Vec::new();
        for stream in streams {
            stream.lock().dump_pending(&mut out);
        }
        self.dispatch(out);
    }

    fn dispatch(&self, out: Vec<Emission>) {
        if out.is_empty() {
            return;
        }

        let listeners = self.listeners.read().clone();
        for emission in &out {
            for listener in &listeners {
                match emission {
                    Emission::Raw(m) => listener.raw_macro_added(m),
                    Emission::Finalized(m) => listener.macro_added(m),
                }
            }
        }
    }
}
