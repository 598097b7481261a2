use std::fs;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use editlog_workspace::{Config, DEFAULT_CONFIG_NAME};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory persisted histories are written to
    #[arg(long)]
    pub history_dir: Option<String>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = Config::default();
    if let Some(history_dir) = args.history_dir {
        config.history_dir = history_dir;
    }

    let content = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, content)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!("  Histories go to {}", config.history_dir(cwd).display());
    Ok(())
}
