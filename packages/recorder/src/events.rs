//! Host notifications consumed by the recorder

use editlog_common::Timestamp;
use editlog_history::{ResourceAction, ResourceTarget};
use serde::{Deserialize, Serialize};

/// Well-known command identifiers
pub mod commands {
    pub const COPY: &str = "edit.copy";
    pub const COPY_QUALIFIED_NAME: &str = "edit.copy.qualified-name";
    pub const CUT: &str = "edit.cut";
    pub const PASTE: &str = "edit.paste";
    pub const DELETE: &str = "edit.delete";

    /// Commands in a category with this suffix open a refactoring grouping
    pub const REFACTORING_CATEGORY_SUFFIX: &str = "category.refactoring";

    pub fn is_copy(command_id: &str) -> bool {
        command_id == COPY || command_id == COPY_QUALIFIED_NAME
    }
}

/// A buffer is about to change. `deleted` is the text being replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    pub path: String,
    pub offset: usize,
    #[serde(default)]
    pub inserted: String,
    #[serde(default)]
    pub deleted: String,
    pub time: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UndoPhase {
    AboutToUndo,
    AboutToRedo,
    Undone,
    Redone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoNotification {
    pub path: String,
    pub phase: UndoPhase,
    pub time: Timestamp,
}

/// Selected text at the time a command ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandExecution {
    /// File of the active editor, if any
    #[serde(default)]
    pub path: Option<String>,
    pub command_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub selection: Option<Selection>,
    pub time: Timestamp,
}

impl CommandExecution {
    pub fn is_refactoring(&self) -> bool {
        self.category
            .as_deref()
            .map_or(false, |c| c.ends_with(commands::REFACTORING_CATEGORY_SUFFIX))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefactoringPhase {
    AboutToPerform,
    Performed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactoringNotification {
    pub description: String,
    pub phase: RefactoringPhase,
    pub time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChange {
    pub path: String,
    pub kind: ResourceAction,
    pub target: ResourceTarget,
    /// Path on the other side of a move or rename
    #[serde(default)]
    pub identical_path: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    pub time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorMove {
    pub path: String,
    pub time: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refactoring_category() {
        let mut command = CommandExecution {
            path: Some("/a".into()),
            command_id: "rename.element".into(),
            category: Some("org.example.category.refactoring".into()),
            selection: None,
            time: 0,
        };
        assert!(command.is_refactoring());

        command.category = Some("edit".into());
        assert!(!command.is_refactoring());

        command.category = None;
        assert!(!command.is_refactoring());
    }

    #[test]
    fn test_copy_commands() {
        assert!(commands::is_copy(commands::COPY));
        assert!(commands::is_copy(commands::COPY_QUALIFIED_NAME));
        assert!(!commands::is_copy(commands::CUT));
    }
}
