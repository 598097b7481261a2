use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use editlog_common::{parse_time, Timestamp};
use editlog_history::{to_document_string, Operation, OperationHistory};

use super::load_history;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// History files to read (default: every file in the history directory)
    pub files: Vec<PathBuf>,

    /// Only operations related to this file
    #[arg(short, long)]
    pub path: Option<String>,

    /// Only operations at or after this time (YYYY/MM/DD HH:MM:SS)
    #[arg(long)]
    pub since: Option<String>,

    /// Only operations at or before this time (YYYY/MM/DD HH:MM:SS)
    #[arg(long)]
    pub until: Option<String>,

    /// Print the history document instead of a listing
    #[arg(long)]
    pub json: bool,
}

pub fn show(args: ShowArgs, cwd: &Path, dir: Option<&Path>) -> Result<()> {
    let since = args.since.as_deref().map(time_bound).transpose()?;
    let until = args.until.as_deref().map(time_bound).transpose()?;

    let history = load_history(&args.files, cwd, dir)?;
    let history = select(&history, args.path.as_deref(), since, until);

    if history.is_empty() {
        println!("{}", "No operations recorded".yellow());
        return Ok(());
    }

    if args.json {
        println!("{}", to_document_string(&history)?);
        return Ok(());
    }

    for (index, op) in history.iter().enumerate() {
        println!("{:>5} {}", index.to_string().bright_black(), colorize(op));
    }
    println!();
    println!("   Operations: {}", history.len());
    Ok(())
}

fn time_bound(text: &str) -> Result<Timestamp> {
    parse_time(text).ok_or_else(|| anyhow!("Invalid time: {} (expected YYYY/MM/DD HH:MM:SS)", text))
}

fn select(
    history: &OperationHistory,
    path: Option<&str>,
    since: Option<Timestamp>,
    until: Option<Timestamp>,
) -> OperationHistory {
    let history = match path {
        Some(path) => history.filter_by_path(path),
        None => history.clone(),
    };

    let ops = history
        .into_operations()
        .into_iter()
        .filter(|op| since.map_or(true, |since| op.time() >= since))
        .filter(|op| until.map_or(true, |until| op.time() <= until))
        .collect();
    OperationHistory::from_operations(ops)
}

fn colorize(op: &Operation) -> String {
    let line = op.to_string();
    match op {
        Operation::Normal(_) => line.normal().to_string(),
        Operation::Compound(_) => line.cyan().to_string(),
        Operation::Copy(_) => line.bright_black().to_string(),
        Operation::File(_) => line.green().to_string(),
        Operation::Menu(_) => line.magenta().to_string(),
        Operation::Resource(_) => line.yellow().to_string(),
    }
}
