//! Read access to the persisted history directory

use std::path::{Path, PathBuf};

use editlog_common::Timestamp;
use editlog_history::{read_history, OperationHistory};
use tracing::warn;

use crate::errors::WorkspaceResult;

/// A persisted history file and the number of operations it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFile {
    pub path: PathBuf,
    /// Time encoded in the file name
    pub written: Option<Timestamp>,
    pub operations: usize,
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// History files in write order. A missing directory holds no files.
    pub fn files(&self) -> WorkspaceResult<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();

        files.sort_by_key(|path| (written_at(path), path.clone()));
        Ok(files)
    }

    pub fn read(&self, path: &Path) -> WorkspaceResult<OperationHistory> {
        Ok(read_history(path)?)
    }

    /// Every file with its operation count; unreadable files are skipped
    pub fn summaries(&self) -> WorkspaceResult<Vec<HistoryFile>> {
        let mut summaries = Vec::new();
        for path in self.files()? {
            match read_history(&path) {
                Ok(history) => summaries.push(HistoryFile {
                    written: written_at(&path),
                    operations: history.len(),
                    path,
                }),
                Err(err) => warn!(path = %path.display(), error = %err, "skipped history file"),
            }
        }
        Ok(summaries)
    }

    /// All persisted operations merged into one sorted history
    pub fn read_all(&self) -> WorkspaceResult<OperationHistory> {
        let mut merged = OperationHistory::new();
        for path in self.files()? {
            match read_history(&path) {
                Ok(history) => merged.merge(history),
                Err(err) => warn!(path = %path.display(), error = %err, "skipped history file"),
            }
        }
        merged.sort();
        Ok(merged)
    }
}

/// Millisecond timestamp encoded in a history file name
fn written_at(path: &Path) -> Option<Timestamp> {
    path.file_stem()?.to_str()?.parse().ok()
}
