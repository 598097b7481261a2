mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    files, init, merge, restore, rewind, show, FilesArgs, InitArgs, MergeArgs, RestoreArgs,
    RewindArgs, ShowArgs,
};
use tracing_subscriber::EnvFilter;

/// Editlog CLI - inspect and replay recorded edit histories
#[derive(Parser, Debug)]
#[command(name = "editlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// History directory (defaults to the one in editlog.config.json)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Log recoverable problems and progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default editlog.config.json
    Init(InitArgs),

    /// Print recorded operations
    Show(ShowArgs),

    /// List persisted history files
    Files(FilesArgs),

    /// Replay a file's operations forward and print the snapshot
    Restore(RestoreArgs),

    /// Undo a file's last operations starting from its final text
    Rewind(RewindArgs),

    /// Merge history files into one sorted history
    Merge(MergeArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };
    let dir = cli.dir.as_deref();

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Show(args) => show(args, &cwd, dir),
        Command::Files(args) => files(args, &cwd, dir),
        Command::Restore(args) => restore(args, &cwd, dir),
        Command::Rewind(args) => rewind(args, &cwd, dir),
        Command::Merge(args) => merge(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
