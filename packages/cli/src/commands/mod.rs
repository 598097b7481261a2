pub mod files;
pub mod init;
pub mod merge;
pub mod restore;
pub mod rewind;
pub mod show;

pub use files::{files, FilesArgs};
pub use init::{init, InitArgs};
pub use merge::{merge, MergeArgs};
pub use restore::{restore, RestoreArgs};
pub use rewind::{rewind, RewindArgs};
pub use show::{show, ShowArgs};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use editlog_history::{read_history, FileAction, Operation, OperationHistory};
use editlog_workspace::{Config, HistoryStore};

/// The history directory named on the command line, or the configured one
pub fn history_store(cwd: &Path, dir: Option<&Path>) -> Result<HistoryStore> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => Config::load(cwd)
            .context("Failed to load editlog.config.json")?
            .history_dir(cwd),
    };
    Ok(HistoryStore::new(dir))
}

/// Operations of the given files, or of the whole history directory when
/// no file is named
pub fn load_history(files: &[PathBuf], cwd: &Path, dir: Option<&Path>) -> Result<OperationHistory> {
    if files.is_empty() {
        return Ok(history_store(cwd, dir)?.read_all()?);
    }

    let mut merged = OperationHistory::new();
    for file in files {
        let history =
            read_history(file).with_context(|| format!("Failed to read {}", file.display()))?;
        merged.merge(history);
    }
    merged.sort();
    Ok(merged)
}

/// Text of `path` when it was first opened or created
pub fn initial_code(history: &OperationHistory, path: &str) -> String {
    history
        .iter()
        .find_map(|op| match op {
            Operation::File(file)
                if file.path == path
                    && matches!(file.action, FileAction::Open | FileAction::New) =>
            {
                Some(file.code.clone().unwrap_or_default())
            }
            _ => None,
        })
        .unwrap_or_default()
}
