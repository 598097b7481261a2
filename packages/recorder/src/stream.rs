//! # Recording Stream
//!
//! Per-file state machine that turns host notifications into finalized
//! macros.
//!
//! A stream keeps a shadow copy of the buffer (`pre_code`) advanced by every
//! macro it records. Each text edit is checked against that copy before it
//! is recorded, so a macro that no longer matches the buffer is dropped
//! instead of corrupting the log. When the host buffer and the shadow copy
//! drift apart, [`DocStream::need_diff`] reconciles them with synthetic
//! `Diff` macros.
//!
//! Streams never call listeners directly. Everything they observe or
//! finalize is pushed to an [`Emission`] list which the recorder dispatches
//! once the stream lock is released.

use editlog_common::{char_len, slice_chars, splice, Timestamp};
use tracing::{debug, warn};

use crate::assembler::{Assembled, CompoundAssembler};
use crate::compressor::MacroCompressor;
use crate::diff::DiffMacroGenerator;
use crate::events::{commands, Selection, TextChange, UndoPhase};
use crate::macros::{
    CopyMacro, DocumentMacro, EditType, ExecutionMacro, Macro, ResourceMacro, TriggerMacro,
};

pub const DIFF_LABEL: &str = "Diff";

/// Something a stream produced for listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Observed before grouping
    Raw(Macro),
    /// Final, ready to become an operation
    Finalized(Macro),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Attached to an open editor: compresses keystrokes and detects
    /// cut, copy and paste
    Editor,
    /// File not open in an editor: every change is recorded as is
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UndoState {
    None,
    Undo,
    Redo,
}

#[derive(Debug)]
pub struct DocStream {
    path: String,
    mode: StreamMode,
    compressor: Option<MacroCompressor>,
    pre_code: String,
    assembler: CompoundAssembler,
    last_raw: Option<Macro>,
    pending: Option<DocumentMacro>,
    undo: UndoState,
}

impl DocStream {
    /// Background streams never compress, whatever `compressor` is
    pub fn new(
        path: impl Into<String>,
        mode: StreamMode,
        code: impl Into<String>,
        compressor: Option<MacroCompressor>,
    ) -> Self {
        let compressor = match mode {
            StreamMode::Editor => compressor,
            StreamMode::Background => None,
        };

        Self {
            path: path.into(),
            mode,
            compressor,
            pre_code: code.into(),
            assembler: CompoundAssembler::new(),
            last_raw: None,
            pending: None,
            undo: UndoState::None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Buffer contents as far as recorded macros account for them
    pub fn pre_code(&self) -> &str {
        &self.pre_code
    }

    pub fn pending(&self) -> Option<&DocumentMacro> {
        self.pending.as_ref()
    }

    pub fn is_grouping(&self) -> bool {
        self.assembler.is_grouping()
    }

    /// A buffer edit. While an undo or redo is in progress the edit is
    /// tagged accordingly; inside a refactoring it becomes a cancellation.
    pub fn text_changed(&mut self, change: TextChange, has_parent: bool, out: &mut Vec<Emission>) {
        let kind = match self.undo {
            UndoState::None => EditType::Typing,
            UndoState::Undo => EditType::Undo,
            UndoState::Redo => EditType::Redo,
        };
        let m = DocumentMacro::new(
            change.time,
            kind,
            change.path,
            change.offset,
            change.inserted,
            change.deleted,
        );
        if m.is_empty() {
            debug!(path = %self.path, "drop empty text change");
            return;
        }

        if kind == EditType::Typing {
            self.record_document_macro(m, out);
        } else {
            let m = if has_parent {
                Macro::Cancel(m)
            } else {
                Macro::Document(m)
            };
            self.record_raw(m.clone(), out);
            self.dump_macros(m, out);
        }
    }

    fn record_document_macro(&mut self, mut m: DocumentMacro, out: &mut Vec<Emission>) {
        let cut_or_paste = self.mode == StreamMode::Editor && self.tag_cut_paste(&mut m);
        self.record_raw(Macro::Document(m.clone()), out);

        if cut_or_paste {
            self.dump_macros(Macro::Document(m), out);
            return;
        }

        let combined = match &self.compressor {
            Some(compressor) if compressor.can_combine(&m) => {
                Some(compressor.combine(self.pending.as_ref(), &m))
            }
            _ => None,
        };

        match combined {
            Some(Some(fused)) => self.pending = Some(fused),
            Some(None) => {
                self.dump_pending(out);
                self.pending = Some(m);
            }
            None => self.dump_macros(Macro::Document(m), out),
        }
    }

    /// An edit right after a cut or paste command is that cut or paste
    fn tag_cut_paste(&self, m: &mut DocumentMacro) -> bool {
        let command_id = match &self.last_raw {
            Some(Macro::Execution(exec)) => exec.command_id.as_str(),
            _ => return false,
        };

        if command_id == commands::CUT {
            m.kind = EditType::Cut;
            true
        } else if command_id == commands::PASTE {
            m.kind = EditType::Paste;
            true
        } else {
            false
        }
    }

    /// A command ran against this file. Copy commands with a selection also
    /// record the copied text.
    pub fn record_execution(
        &mut self,
        mut exec: ExecutionMacro,
        selection: Option<Selection>,
        out: &mut Vec<Emission>,
    ) {
        let editor = self.mode == StreamMode::Editor;
        if editor && exec.command_id == commands::DELETE {
            exec.label = "Delete".to_string();
        }

        let time = exec.time;
        let is_copy = commands::is_copy(&exec.command_id);
        self.record_raw(Macro::Execution(exec.clone()), out);
        self.dump_macros(Macro::Execution(exec), out);

        if let (true, true, Some(selection)) = (editor, is_copy, selection) {
            let copy = Macro::Copy(CopyMacro {
                time,
                path: self.path.clone(),
                offset: selection.offset,
                copied: selection.text,
            });
            self.record_raw(copy.clone(), out);
            self.dump_macros(copy, out);
        }
    }

    pub fn record_trigger(&mut self, trigger: TriggerMacro, out: &mut Vec<Emission>) {
        let m = Macro::Trigger(trigger);
        self.record_raw(m.clone(), out);
        self.dump_macros(m, out);
    }

    pub fn record_resource(&mut self, resource: ResourceMacro, out: &mut Vec<Emission>) {
        let m = Macro::Resource(resource);
        self.record_raw(m.clone(), out);
        self.dump_macros(m, out);
    }

    /// Undo/redo lifecycle. Outside a refactoring the undo is bracketed by
    /// BEGIN/END triggers so its edits form one compound.
    pub fn undo_notification(
        &mut self,
        phase: UndoPhase,
        has_parent: bool,
        time: Timestamp,
        out: &mut Vec<Emission>,
    ) {
        let (label, trigger_kind, next) = match phase {
            UndoPhase::AboutToUndo => ("Undo", true, UndoState::Undo),
            UndoPhase::AboutToRedo => ("Redo", true, UndoState::Redo),
            UndoPhase::Undone => ("Undo", false, UndoState::None),
            UndoPhase::Redone => ("Redo", false, UndoState::None),
        };

        if !has_parent {
            let trigger = if trigger_kind {
                TriggerMacro::begin(time, label, self.path.clone())
            } else {
                TriggerMacro::end(time, label, self.path.clone())
            };
            self.record_trigger(trigger, out);
        }
        self.undo = next;
    }

    pub fn cursor_moved(&mut self, time: Timestamp, out: &mut Vec<Emission>) {
        let trigger = TriggerMacro::cursor_change(time, self.path.clone());
        self.record_trigger(trigger, out);
    }

    fn record_raw(&mut self, m: Macro, out: &mut Vec<Emission>) {
        self.last_raw = Some(m.clone());
        out.push(Emission::Raw(m));
    }

    /// Record the pending compressed macro. One that no longer matches the
    /// buffer is discarded.
    pub fn dump_pending(&mut self, out: &mut Vec<Emission>) {
        if let Some(pending) = self.pending.take() {
            let m = Macro::Document(pending);
            if self.has_mismatch(&m) {
                return;
            }
            if self.record(m.clone(), out) {
                self.apply(&m);
            }
        }
    }

    fn dump_macros(&mut self, m: Macro, out: &mut Vec<Emission>) {
        self.dump_pending(out);

        if self.has_mismatch(&m) {
            return;
        }
        if self.record(m.clone(), out) {
            self.apply(&m);
        }
    }

    /// Feed `m` to the assembler. Returns false when the log dropped it, in
    /// which case the shadow buffer must not move past it and the next
    /// reconciliation records the change instead.
    fn record(&mut self, m: Macro, out: &mut Vec<Emission>) -> bool {
        match self.assembler.record(m) {
            Assembled::Finalized(m) => {
                out.push(Emission::Finalized(m));
                true
            }
            Assembled::Unresolved(_) => false,
            Assembled::Pending | Assembled::Cancelled | Assembled::Discarded => true,
        }
    }

    /// Advance the shadow buffer past a recorded edit
    fn apply(&mut self, m: &Macro) {
        let dm = match m.as_document() {
            Some(dm) => dm,
            None => return,
        };

        match splice(&self.pre_code, dm.offset, char_len(&dm.deleted), &dm.inserted) {
            Ok(code) => self.pre_code = code,
            Err(e) => warn!(path = %self.path, error = %e, "could not apply macro"),
        }
    }

    fn has_mismatch(&self, m: &Macro) -> bool {
        let dm = match m.as_document() {
            Some(dm) => dm,
            None => return false,
        };

        let len = char_len(&self.pre_code);
        if dm.offset > len {
            warn!(path = %self.path, offset = dm.offset, len, "macro offset past end of buffer");
            return true;
        }

        let found = slice_chars(&self.pre_code, dm.offset, char_len(&dm.deleted));
        if found != Some(dm.deleted.as_str()) {
            warn!(
                path = %self.path,
                offset = dm.offset,
                expected = %dm.deleted,
                found = found.unwrap_or(""),
                "macro does not match buffer, discarding"
            );
            return true;
        }

        false
    }

    /// Reconcile the shadow buffer with `current`. Returns whether any
    /// `Diff` macros were recorded.
    pub fn need_diff(
        &mut self,
        current: Option<String>,
        time: Timestamp,
        generator: &DiffMacroGenerator,
        out: &mut Vec<Emission>,
    ) -> bool {
        let current = match current {
            Some(current) => current,
            None => return false,
        };
        if current == self.pre_code {
            return false;
        }

        let macros = generator.generate(time, &self.path, &self.pre_code, &current);
        let recorded = !macros.is_empty();
        if recorded {
            self.record_diff_macros(time, macros, out);
        }

        self.pre_code = current;
        recorded
    }

    fn record_diff_macros(
        &mut self,
        time: Timestamp,
        macros: Vec<DocumentMacro>,
        out: &mut Vec<Emission>,
    ) {
        self.dump_pending(out);

        let begin = Macro::Trigger(TriggerMacro::begin(time, DIFF_LABEL, self.path.clone()));
        self.record_raw(begin.clone(), out);
        self.record(begin, out);

        for m in macros {
            let m = Macro::Document(m);
            self.record_raw(m.clone(), out);
            self.record(m, out);
        }

        let end = Macro::Trigger(TriggerMacro::end(time, DIFF_LABEL, self.path.clone()));
        self.record_raw(end.clone(), out);
        self.record(end, out);
    }

    /// Close any open compound
    pub fn close_group(&mut self, out: &mut Vec<Emission>) {
        if let Assembled::Finalized(m) = self.assembler.close() {
            out.push(Emission::Finalized(m));
        }
    }

    /// Flush the pending macro and reconcile with the host buffer. An open
    /// compound stays open. Safe to call with nothing pending.
    pub fn flush(
        &mut self,
        current: Option<String>,
        time: Timestamp,
        generator: &DiffMacroGenerator,
        out: &mut Vec<Emission>,
    ) {
        self.dump_pending(out);
        self.need_diff(current, time, generator, out);
    }

    /// [`flush`](Self::flush), then close any open compound
    pub fn break_macro(
        &mut self,
        current: Option<String>,
        time: Timestamp,
        generator: &DiffMacroGenerator,
        out: &mut Vec<Emission>,
    ) {
        self.flush(current, time, generator, out);
        self.close_group(out);
    }

    /// Final flush before the stream is dropped
    pub fn stop(
        &mut self,
        current: Option<String>,
        time: Timestamp,
        generator: &DiffMacroGenerator,
        out: &mut Vec<Emission>,
    ) {
        self.break_macro(current, time, generator, out);
        self.last_raw = None;
        self.undo = UndoState::None;
    }
}
