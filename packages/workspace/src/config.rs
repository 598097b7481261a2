use std::path::{Path, PathBuf};
use std::time::Duration;

use editlog_recorder::{
    DiffMacroGenerator, MacroCompressor, DEFAULT_DELIMITERS, DEFAULT_DIFF_TIMEOUT,
    DEFAULT_EDIT_COST,
};
use serde::{Deserialize, Serialize};

use crate::errors::WorkspaceResult;

pub const DEFAULT_CONFIG_NAME: &str = "editlog.config.json";

/// Editlog configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory persisted histories are written to
    #[serde(default = "default_history_dir")]
    pub history_dir: String,

    /// How eagerly reconciliation merges nearby changes into one block
    #[serde(default = "default_edit_cost")]
    pub edit_cost: usize,

    /// Milliseconds one reconciliation may spend diffing before it settles
    /// for coarser blocks
    #[serde(default = "default_diff_timeout_ms")]
    pub diff_timeout_ms: u64,

    /// Characters that end a compressed typing run
    #[serde(default = "default_delimiters")]
    pub delimiters: Vec<char>,

    /// Coalesce keystrokes in editor streams
    #[serde(default = "default_compress")]
    pub compress: bool,

    /// Recorded author; defaults to the current user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

fn default_history_dir() -> String {
    ".editlog/history".to_string()
}

fn default_edit_cost() -> usize {
    DEFAULT_EDIT_COST
}

fn default_diff_timeout_ms() -> u64 {
    DEFAULT_DIFF_TIMEOUT.as_millis() as u64
}

fn default_delimiters() -> Vec<char> {
    DEFAULT_DELIMITERS.to_vec()
}

fn default_compress() -> bool {
    true
}

impl Config {
    /// Load config from a directory
    pub fn load(dir: &Path) -> WorkspaceResult<Self> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// History directory, resolved against `root` when relative
    pub fn history_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.history_dir)
    }

    pub fn compressor(&self) -> Option<MacroCompressor> {
        self.compress
            .then(|| MacroCompressor::with_delimiters(self.delimiters.iter().copied()))
    }

    pub fn diff_generator(&self) -> DiffMacroGenerator {
        DiffMacroGenerator::new(self.edit_cost)
            .with_timeout(Duration::from_millis(self.diff_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_dir: default_history_dir(),
            edit_cost: default_edit_cost(),
            diff_timeout_ms: default_diff_timeout_ms(),
            delimiters: default_delimiters(),
            compress: default_compress(),
            author: None,
        }
    }
}
