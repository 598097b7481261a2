//! # Edit Macros
//!
//! Recorded descriptions of editing activity before they are finalized into
//! operations.
//!
//! A [`DocumentMacro`] is the atomic text edit: one offset, the text it
//! inserted and the text it deleted. Exactly one of four shapes applies
//! (insert, delete, replace, empty); empty macros are dropped before they
//! reach a stream.
//!
//! [`TriggerMacro`]s are transient. They open and close compound groupings
//! and are never finalized on their own.

use std::fmt;

use editlog_common::{abbreviate, char_len, Timestamp};
use editlog_history::{ResourceAction, ResourceTarget};
use serde::{Deserialize, Serialize};

/// Semantic tag of a text edit macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditType {
    Typing,
    Cut,
    Paste,
    Undo,
    Redo,
    Diff,
}

impl EditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditType::Typing => "Typing",
            EditType::Cut => "Cut",
            EditType::Paste => "Paste",
            EditType::Undo => "Undo",
            EditType::Redo => "Redo",
            EditType::Diff => "Diff",
        }
    }
}

/// The four disjoint shapes of a text edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroShape {
    Insert,
    Delete,
    Replace,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMacro {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub kind: EditType,
    pub path: String,
    /// Leftmost char offset touched by the edit
    pub offset: usize,
    pub inserted: String,
    pub deleted: String,
}

impl DocumentMacro {
    pub fn new(
        time: Timestamp,
        kind: EditType,
        path: impl Into<String>,
        offset: usize,
        inserted: impl Into<String>,
        deleted: impl Into<String>,
    ) -> Self {
        Self {
            start_time: time,
            end_time: time,
            kind,
            path: path.into(),
            offset,
            inserted: inserted.into(),
            deleted: deleted.into(),
        }
    }

    pub fn shape(&self) -> MacroShape {
        match (self.inserted.is_empty(), self.deleted.is_empty()) {
            (false, true) => MacroShape::Insert,
            (true, false) => MacroShape::Delete,
            (false, false) => MacroShape::Replace,
            (true, true) => MacroShape::Empty,
        }
    }

    pub fn is_insert(&self) -> bool {
        self.shape() == MacroShape::Insert
    }

    pub fn is_delete(&self) -> bool {
        self.shape() == MacroShape::Delete
    }

    pub fn is_replace(&self) -> bool {
        self.shape() == MacroShape::Replace
    }

    pub fn is_empty(&self) -> bool {
        self.shape() == MacroShape::Empty
    }

    /// Offset just past the inserted text
    pub fn inserted_end(&self) -> usize {
        self.offset + char_len(&self.inserted)
    }

    /// Whether `other` undoes this macro: same offset, texts swapped
    pub fn is_reversed_by(&self, other: &DocumentMacro) -> bool {
        self.offset == other.offset
            && self.inserted == other.deleted
            && self.deleted == other.inserted
    }
}

/// Text copied to the clipboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyMacro {
    pub time: Timestamp,
    pub path: String,
    pub offset: usize,
    pub copied: String,
}

/// A command executed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMacro {
    pub time: Timestamp,
    pub path: String,
    pub command_id: String,
    /// "Exec", or "Delete" for the delete command
    pub label: String,
}

/// A workspace resource changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMacro {
    pub time: Timestamp,
    pub path: String,
    pub action: ResourceAction,
    pub target: ResourceTarget,
    pub identical_path: String,
    pub code: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    Begin,
    End,
    CursorChange,
}

/// Transient grouping signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMacro {
    pub time: Timestamp,
    pub path: String,
    pub label: String,
    pub kind: TriggerKind,
}

impl TriggerMacro {
    pub fn begin(time: Timestamp, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(time, label, path, TriggerKind::Begin)
    }

    pub fn end(time: Timestamp, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(time, label, path, TriggerKind::End)
    }

    pub fn cursor_change(time: Timestamp, path: impl Into<String>) -> Self {
        Self::new(time, CURSOR_CHANGE_LABEL, path, TriggerKind::CursorChange)
    }

    fn new(
        time: Timestamp,
        label: impl Into<String>,
        path: impl Into<String>,
        kind: TriggerKind,
    ) -> Self {
        Self {
            time,
            path: path.into(),
            label: label.into(),
            kind,
        }
    }
}

pub const CURSOR_CHANGE_LABEL: &str = "Cursor.position.change";

/// A run of macros grouped under one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundMacro {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub label: String,
    pub path: String,
    pub macros: Vec<Macro>,
}

impl CompoundMacro {
    pub fn new(time: Timestamp, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            start_time: time,
            end_time: time,
            label: label.into(),
            path: path.into(),
            macros: Vec::new(),
        }
    }

    pub fn add(&mut self, m: Macro) {
        self.macros.push(m);
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Remove the child edit that `cancel` reverses. Only top-level text
    /// edits are searched, most recent first.
    pub fn cancel(&mut self, cancel: &DocumentMacro) -> bool {
        let index = self.macros.iter().rposition(|m| match m {
            Macro::Document(child) => child.is_reversed_by(cancel),
            _ => false,
        });

        match index {
            Some(index) => {
                self.macros.remove(index);
                true
            }
            None => false,
        }
    }

    /// Widen the time span to cover every child
    pub fn set_times(&mut self) {
        for m in &self.macros {
            self.start_time = self.start_time.min(m.start_time());
            self.end_time = self.end_time.max(m.end_time());
        }
    }

    /// Text edit children in order
    pub fn document_macros(&self) -> impl Iterator<Item = &DocumentMacro> {
        self.macros.iter().filter_map(|m| match m {
            Macro::Document(dm) => Some(dm),
            _ => None,
        })
    }
}

/// Anything a recording stream can observe or emit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Macro {
    Document(DocumentMacro),
    /// An undo or redo that reverses an edit inside an open grouping
    Cancel(DocumentMacro),
    Copy(CopyMacro),
    Execution(ExecutionMacro),
    Resource(ResourceMacro),
    Trigger(TriggerMacro),
    Compound(CompoundMacro),
}

impl Macro {
    pub fn start_time(&self) -> Timestamp {
        match self {
            Macro::Document(m) | Macro::Cancel(m) => m.start_time,
            Macro::Copy(m) => m.time,
            Macro::Execution(m) => m.time,
            Macro::Resource(m) => m.time,
            Macro::Trigger(m) => m.time,
            Macro::Compound(m) => m.start_time,
        }
    }

    pub fn end_time(&self) -> Timestamp {
        match self {
            Macro::Document(m) | Macro::Cancel(m) => m.end_time,
            Macro::Compound(m) => m.end_time,
            other => other.start_time(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Macro::Document(m) | Macro::Cancel(m) => &m.path,
            Macro::Copy(m) => &m.path,
            Macro::Execution(m) => &m.path,
            Macro::Resource(m) => &m.path,
            Macro::Trigger(m) => &m.path,
            Macro::Compound(m) => &m.path,
        }
    }

    /// The text edit carried by a document or cancel macro
    pub fn as_document(&self) -> Option<&DocumentMacro> {
        match self {
            Macro::Document(m) | Macro::Cancel(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Macro::Document(m) | Macro::Cancel(m) => {
                let tag = if matches!(self, Macro::Cancel(_)) { "CANCEL" } else { "DOC" };
                write!(
                    f,
                    "{}({}) = {} {}-{} offset={} ins=[{}] del=[{}]",
                    tag,
                    m.kind.as_str(),
                    m.path,
                    m.start_time,
                    m.end_time,
                    m.offset,
                    abbreviate(&m.inserted),
                    abbreviate(&m.deleted)
                )
            }
            Macro::Copy(m) => write!(
                f,
                "COPY = {} {} offset={} copied=[{}]",
                m.path,
                m.time,
                m.offset,
                abbreviate(&m.copied)
            ),
            Macro::Execution(m) => {
                write!(f, "EXEC({}) = {} {} {}", m.label, m.path, m.time, m.command_id)
            }
            Macro::Resource(m) => write!(
                f,
                "RESOURCE({}) = {} {} target={}",
                m.action.as_str(),
                m.path,
                m.time,
                m.target.as_str()
            ),
            Macro::Trigger(m) => {
                write!(f, "TRIGGER({:?}) = {} {} {}", m.kind, m.path, m.time, m.label)
            }
            Macro::Compound(m) => write!(
                f,
                "COMP({}) = {} {}-{} num={}",
                m.label,
                m.path,
                m.start_time,
                m.end_time,
                m.macros.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing(time: Timestamp, offset: usize, ins: &str, del: &str) -> DocumentMacro {
        DocumentMacro::new(time, EditType::Typing, "/a", offset, ins, del)
    }

    #[test]
    fn test_shapes() {
        assert_eq!(typing(0, 0, "a", "").shape(), MacroShape::Insert);
        assert_eq!(typing(0, 0, "", "a").shape(), MacroShape::Delete);
        assert_eq!(typing(0, 0, "b", "a").shape(), MacroShape::Replace);
        assert_eq!(typing(0, 0, "", "").shape(), MacroShape::Empty);
    }

    #[test]
    fn test_cancel_removes_most_recent_match() {
        let mut compound = CompoundMacro::new(10, "Refactoring", "/a");
        compound.add(Macro::Document(typing(11, 4, "x", "")));
        compound.add(Macro::Document(typing(12, 0, "foo", "bar")));
        compound.add(Macro::Document(typing(13, 4, "x", "")));

        assert!(compound.cancel(&typing(14, 4, "", "x")));
        assert_eq!(compound.len(), 2);
        assert_eq!(compound.macros[1].start_time(), 12);
    }

    #[test]
    fn test_cancel_requires_exact_reverse() {
        let mut compound = CompoundMacro::new(10, "Refactoring", "/a");
        compound.add(Macro::Document(typing(11, 0, "foo", "bar")));

        assert!(!compound.cancel(&typing(12, 1, "bar", "foo")));
        assert!(!compound.cancel(&typing(12, 0, "bar", "fo")));
        assert!(compound.cancel(&typing(12, 0, "bar", "foo")));
        assert!(compound.is_empty());
    }

    #[test]
    fn test_cancel_skips_nested_compounds() {
        let mut inner = CompoundMacro::new(11, "Diff", "/a");
        inner.add(Macro::Document(typing(11, 0, "x", "")));

        let mut outer = CompoundMacro::new(10, "Refactoring", "/a");
        outer.add(Macro::Compound(inner));

        assert!(!outer.cancel(&typing(12, 0, "", "x")));
    }

    #[test]
    fn test_set_times_covers_children() {
        let mut compound = CompoundMacro::new(10, "Undo", "/a");
        let mut child = typing(8, 0, "x", "");
        child.end_time = 15;
        compound.add(Macro::Document(child));
        compound.set_times();

        assert_eq!((compound.start_time, compound.end_time), (8, 15));
    }
}
