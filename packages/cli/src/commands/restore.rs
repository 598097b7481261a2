use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use editlog_history::restore_at;

use super::{initial_code, load_history};

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// History files to read (default: every file in the history directory)
    pub files: Vec<PathBuf>,

    /// File whose text is restored
    #[arg(short, long)]
    pub path: String,

    /// Number of the file's operations to replay
    #[arg(short, long)]
    pub index: usize,

    /// Starting text (default: the text the file was first opened with)
    #[arg(long)]
    pub from: Option<PathBuf>,
}

pub fn restore(args: RestoreArgs, cwd: &Path, dir: Option<&Path>) -> Result<()> {
    let history = load_history(&args.files, cwd, dir)?;

    let initial = match &args.from {
        Some(file) => fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?,
        None => initial_code(&history, &args.path),
    };

    let snapshot = restore_at(&history, &args.path, &initial, args.index)
        .with_context(|| format!("Failed to replay {}", args.path))?;

    let available = history.filter_by_path(&args.path).len();
    eprintln!(
        "{} {} after {} of {} operations",
        "✓".green(),
        args.path.bright_white(),
        args.index.min(available),
        available
    );
    print!("{}", snapshot);
    Ok(())
}
