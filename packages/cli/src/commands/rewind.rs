use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use editlog_history::replay_reversely;

use super::load_history;

#[derive(Args, Debug)]
pub struct RewindArgs {
    /// History files to read (default: every file in the history directory)
    pub files: Vec<PathBuf>,

    /// File whose text is rewound
    #[arg(short, long)]
    pub path: String,

    /// Number of operations to undo
    #[arg(short, long)]
    pub steps: usize,

    /// The file's text after its last recorded operation
    #[arg(long)]
    pub from: PathBuf,
}

pub fn rewind(args: RewindArgs, cwd: &Path, dir: Option<&Path>) -> Result<()> {
    let history = load_history(&args.files, cwd, dir)?;
    let current = fs::read_to_string(&args.from)
        .with_context(|| format!("Failed to read {}", args.from.display()))?;

    let related = history.filter_by_path(&args.path);
    let ops = related.operations();
    let steps = args.steps.min(ops.len());
    let snapshot = replay_reversely(&current, &ops[ops.len() - steps..])
        .with_context(|| format!("Failed to rewind {}", args.path))?;

    eprintln!(
        "{} {} rewound {} operations",
        "✓".green(),
        args.path.bright_white(),
        steps
    );
    print!("{}", snapshot);
    Ok(())
}
