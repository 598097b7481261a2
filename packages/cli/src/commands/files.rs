use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use editlog_common::{to_useful_format, yyyymmdd};

use super::history_store;

#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Only files written on this day (YYYYMMDD)
    #[arg(long)]
    pub day: Option<String>,
}

pub fn files(args: FilesArgs, cwd: &Path, dir: Option<&Path>) -> Result<()> {
    let store = history_store(cwd, dir)?;
    println!("📂 {}", store.dir().display().to_string().bright_white());

    let mut total = 0;
    let mut count = 0;
    for summary in store.summaries()? {
        let written = summary.written;
        if let Some(day) = &args.day {
            if written.map(yyyymmdd).as_deref() != Some(day.as_str()) {
                continue;
            }
        }

        let name = summary
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let when = written.map(to_useful_format).unwrap_or_default();
        println!(
            "   {} {} {} operations",
            name.bright_white(),
            when.bright_black(),
            summary.operations
        );
        total += summary.operations;
        count += 1;
    }

    println!();
    println!("   Files: {}", count);
    println!("   Operations: {}", total);
    Ok(())
}
