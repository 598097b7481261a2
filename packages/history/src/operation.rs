//! # Operations
//!
//! The finalized, persisted form of recorded editing activity.
//!
//! Every variant carries the same ordering key: a millisecond timestamp plus
//! a per-timestamp sequence number. The sequence number is owned by
//! [`OperationHistory`](crate::OperationHistory) and assigned at append time;
//! constructors always start it at zero.
//!
//! ## Variants
//!
//! - **Normal**: one text edit (offset, inserted text, deleted text)
//! - **Compound**: an ordered group of operations under a label
//! - **Copy**: text copied out of a file
//! - **File**: file lifecycle (new, open, close, save, delete, activate)
//! - **Menu**: a command executed against a file
//! - **Resource**: a project, package or file added, removed, moved or renamed

use std::fmt;

use editlog_common::{abbreviate, to_useful_format, user_name, Timestamp};
use serde::{Deserialize, Serialize};

/// Semantic tag of a text edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditAction {
    Edit,
    Cut,
    Paste,
    Undo,
    Redo,
    Diff,
}

impl EditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditAction::Edit => "EDIT",
            EditAction::Cut => "CUT",
            EditAction::Paste => "PASTE",
            EditAction::Undo => "UNDO",
            EditAction::Redo => "REDO",
            EditAction::Diff => "DIFF",
        }
    }
}

/// File lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileAction {
    New,
    Open,
    Close,
    Save,
    Delete,
    Act,
    Instant,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::New => "NEW",
            FileAction::Open => "OPEN",
            FileAction::Close => "CLOSE",
            FileAction::Save => "SAVE",
            FileAction::Delete => "DELETE",
            FileAction::Act => "ACT",
            FileAction::Instant => "INSTANT",
        }
    }
}

/// Kind of change reported for a workspace resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceAction {
    Added,
    Removed,
    Changed,
    MovedFrom,
    MovedTo,
    RenamedFrom,
    RenamedTo,
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::Added => "ADDED",
            ResourceAction::Removed => "REMOVED",
            ResourceAction::Changed => "CHANGED",
            ResourceAction::MovedFrom => "MOVED_FROM",
            ResourceAction::MovedTo => "MOVED_TO",
            ResourceAction::RenamedFrom => "RENAMED_FROM",
            ResourceAction::RenamedTo => "RENAMED_TO",
        }
    }

    /// The resource no longer exists under its old path
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            ResourceAction::Removed | ResourceAction::MovedTo | ResourceAction::RenamedTo
        )
    }

    /// The resource now exists under a new path
    pub fn is_addition(&self) -> bool {
        matches!(
            self,
            ResourceAction::Added | ResourceAction::MovedFrom | ResourceAction::RenamedFrom
        )
    }
}

/// What kind of resource a resource operation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceTarget {
    Project,
    Package,
    File,
    Others,
}

impl ResourceTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceTarget::Project => "PROJECT",
            ResourceTarget::Package => "PACKAGE",
            ResourceTarget::File => "FILE",
            ResourceTarget::Others => "OTHERS",
        }
    }
}

/// Discriminant of [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Normal,
    Compound,
    Copy,
    File,
    Menu,
    Resource,
}

/// A single text edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalOperation {
    pub time: Timestamp,
    #[serde(default)]
    pub seq: u32,
    #[serde(rename = "file")]
    pub path: String,
    pub author: String,
    pub offset: usize,
    pub action: EditAction,
    #[serde(default)]
    pub inserted: String,
    #[serde(default)]
    pub deleted: String,
}

impl NormalOperation {
    pub fn new(
        time: Timestamp,
        path: impl Into<String>,
        offset: usize,
        inserted: impl Into<String>,
        deleted: impl Into<String>,
        action: EditAction,
    ) -> Self {
        Self {
            time,
            seq: 0,
            path: path.into(),
            author: user_name().to_string(),
            offset,
            action,
            inserted: inserted.into(),
            deleted: deleted.into(),
        }
    }
}

/// An ordered group of operations recorded as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundOperation {
    pub time: Timestamp,
    #[serde(default)]
    pub seq: u32,
    #[serde(rename = "file")]
    pub path: String,
    pub author: String,
    pub label: String,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl CompoundOperation {
    /// Children are renumbered by position so that their order survives a
    /// sort by (time, seq).
    pub fn new(time: Timestamp, label: impl Into<String>, operations: Vec<Operation>) -> Self {
        let path = operations
            .first()
            .map(|op| op.path().to_string())
            .unwrap_or_default();

        let mut compound = Self {
            time,
            seq: 0,
            path,
            author: user_name().to_string(),
            label: label.into(),
            operations,
        };
        compound.renumber();
        compound
    }

    fn renumber(&mut self) {
        for (index, op) in self.operations.iter_mut().enumerate() {
            op.set_seq(index as u32);
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Non-compound descendants, depth-first in child order
    pub fn leaves(&self) -> Vec<&Operation> {
        let mut leaves = Vec::new();
        collect_leaves(&self.operations, &mut leaves);
        leaves
    }
}

fn collect_leaves<'a>(operations: &'a [Operation], out: &mut Vec<&'a Operation>) {
    for op in operations {
        match op {
            Operation::Compound(compound) => collect_leaves(&compound.operations, out),
            other => out.push(other),
        }
    }
}

/// Text copied to the clipboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOperation {
    pub time: Timestamp,
    #[serde(default)]
    pub seq: u32,
    #[serde(rename = "file")]
    pub path: String,
    pub author: String,
    pub offset: usize,
    #[serde(default)]
    pub copied: String,
}

impl CopyOperation {
    pub fn new(
        time: Timestamp,
        path: impl Into<String>,
        offset: usize,
        copied: impl Into<String>,
    ) -> Self {
        Self {
            time,
            seq: 0,
            path: path.into(),
            author: user_name().to_string(),
            offset,
            copied: copied.into(),
        }
    }
}

/// File lifecycle event, optionally carrying a snapshot of the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperation {
    pub time: Timestamp,
    #[serde(default)]
    pub seq: u32,
    #[serde(rename = "file")]
    pub path: String,
    pub author: String,
    pub action: FileAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl FileOperation {
    pub fn new(
        time: Timestamp,
        path: impl Into<String>,
        action: FileAction,
        code: Option<String>,
    ) -> Self {
        Self {
            time,
            seq: 0,
            path: path.into(),
            author: user_name().to_string(),
            action,
            code,
        }
    }
}

/// A command executed against a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOperation {
    pub time: Timestamp,
    #[serde(default)]
    pub seq: u32,
    #[serde(rename = "file")]
    pub path: String,
    pub author: String,
    pub label: String,
}

impl MenuOperation {
    pub fn new(time: Timestamp, path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            time,
            seq: 0,
            path: path.into(),
            author: user_name().to_string(),
            label: label.into(),
        }
    }
}

/// A change to a workspace resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOperation {
    pub time: Timestamp,
    #[serde(default)]
    pub seq: u32,
    #[serde(rename = "file")]
    pub path: String,
    pub author: String,
    pub action: ResourceAction,
    pub target: ResourceTarget,
    /// Path on the other side of a move or rename
    #[serde(rename = "apath", default)]
    pub identical_path: String,
}

impl ResourceOperation {
    pub fn new(
        time: Timestamp,
        path: impl Into<String>,
        action: ResourceAction,
        target: ResourceTarget,
        identical_path: impl Into<String>,
    ) -> Self {
        Self {
            time,
            seq: 0,
            path: path.into(),
            author: user_name().to_string(),
            action,
            target,
            identical_path: identical_path.into(),
        }
    }
}

/// A finalized operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "normalOperation")]
    Normal(NormalOperation),
    #[serde(rename = "compoundOperation")]
    Compound(CompoundOperation),
    #[serde(rename = "copyOperation")]
    Copy(CopyOperation),
    #[serde(rename = "fileOperation")]
    File(FileOperation),
    #[serde(rename = "menuOperation")]
    Menu(MenuOperation),
    #[serde(rename = "resourceOperation")]
    Resource(ResourceOperation),
}

macro_rules! each_variant {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            Operation::Normal($op) => $body,
            Operation::Compound($op) => $body,
            Operation::Copy($op) => $body,
            Operation::File($op) => $body,
            Operation::Menu($op) => $body,
            Operation::Resource($op) => $body,
        }
    };
}

impl Operation {
    pub fn time(&self) -> Timestamp {
        each_variant!(self, op => op.time)
    }

    pub fn seq(&self) -> u32 {
        each_variant!(self, op => op.seq)
    }

    pub(crate) fn set_seq(&mut self, seq: u32) {
        each_variant!(self, op => op.seq = seq)
    }

    pub fn path(&self) -> &str {
        each_variant!(self, op => op.path.as_str())
    }

    pub fn author(&self) -> &str {
        each_variant!(self, op => op.author.as_str())
    }

    /// Override the recorded author (defaults to the current user)
    pub fn set_author(&mut self, author: impl Into<String>) {
        let author = author.into();
        if let Operation::Compound(compound) = self {
            for child in compound.operations.iter_mut() {
                child.set_author(author.clone());
            }
        }
        each_variant!(self, op => op.author = author)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Normal(_) => OperationKind::Normal,
            Operation::Compound(_) => OperationKind::Compound,
            Operation::Copy(_) => OperationKind::Copy,
            Operation::File(_) => OperationKind::File,
            Operation::Menu(_) => OperationKind::Menu,
            Operation::Resource(_) => OperationKind::Resource,
        }
    }

    /// Edits, compounds and copies are all text-level activity
    pub fn is_text_edit(&self) -> bool {
        matches!(
            self,
            Operation::Normal(_) | Operation::Compound(_) | Operation::Copy(_)
        )
    }

    /// Operations that can change the contents of a buffer
    pub fn is_text_changed(&self) -> bool {
        matches!(self, Operation::Normal(_) | Operation::Compound(_))
    }

    /// Whether this operation touches the given path. A compound matches if
    /// any of its leaves does.
    pub fn is_related_to(&self, path: &str) -> bool {
        match self {
            Operation::Compound(compound) => compound
                .leaves()
                .into_iter()
                .any(|leaf| leaf.path() == path),
            other => other.path() == path,
        }
    }

    pub fn as_file(&self) -> Option<&FileOperation> {
        match self {
            Operation::File(op) => Some(op),
            _ => None,
        }
    }
}

impl From<NormalOperation> for Operation {
    fn from(op: NormalOperation) -> Self {
        Operation::Normal(op)
    }
}

impl From<CompoundOperation> for Operation {
    fn from(op: CompoundOperation) -> Self {
        Operation::Compound(op)
    }
}

impl From<CopyOperation> for Operation {
    fn from(op: CopyOperation) -> Self {
        Operation::Copy(op)
    }
}

impl From<FileOperation> for Operation {
    fn from(op: FileOperation) -> Self {
        Operation::File(op)
    }
}

impl From<MenuOperation> for Operation {
    fn from(op: MenuOperation) -> Self {
        Operation::Menu(op)
    }
}

impl From<ResourceOperation> for Operation {
    fn from(op: ResourceOperation) -> Self {
        Operation::Resource(op)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = to_useful_format(self.time());
        match self {
            Operation::Normal(op) => write!(
                f,
                "{} {} author=[{}] path={} offset={} ins=[{}] del=[{}]",
                time,
                op.action.as_str(),
                op.author,
                op.path,
                op.offset,
                abbreviate(&op.inserted),
                abbreviate(&op.deleted)
            ),
            Operation::Compound(op) => {
                write!(
                    f,
                    "{} COMPOUND author=[{}] label={} num={}",
                    time,
                    op.author,
                    op.label,
                    op.operations.len()
                )?;
                for child in &op.operations {
                    write!(f, "\n  {}", child)?;
                }
                Ok(())
            }
            Operation::Copy(op) => write!(
                f,
                "{} COPY author=[{}] path={} offset={} copied=[{}]",
                time,
                op.author,
                op.path,
                op.offset,
                abbreviate(&op.copied)
            ),
            Operation::File(op) => write!(
                f,
                "{} FILE author=[{}] path={} action={}",
                time,
                op.author,
                op.path,
                op.action.as_str()
            ),
            Operation::Menu(op) => write!(
                f,
                "{} MENU author=[{}] path={} label={}",
                time, op.author, op.path, op.label
            ),
            Operation::Resource(op) => write!(
                f,
                "{} RESOURCE author=[{}] path={} action={} target={} ipath={}",
                time,
                op.author,
                op.path,
                op.action.as_str(),
                op.target.as_str(),
                op.identical_path
            ),
        }
    }
}
