use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use editlog_history::{read_history, write_history, OperationHistory};

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Merged history file to write
    pub output: PathBuf,

    /// History files to merge
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

pub fn merge(args: MergeArgs) -> Result<()> {
    let mut merged = OperationHistory::new();
    for input in &args.inputs {
        let history =
            read_history(input).with_context(|| format!("Failed to read {}", input.display()))?;
        println!("   {} {} operations", input.display(), history.len());
        merged.merge(history);
    }

    if merged.is_empty() {
        bail!("Nothing to merge");
    }

    merged.sort();
    write_history(&merged, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!();
    println!(
        "✨ {} {} operations → {}",
        "Merged".green().bold(),
        merged.len(),
        args.output.display()
    );
    Ok(())
}
