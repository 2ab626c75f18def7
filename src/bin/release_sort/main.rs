mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use release_sort::organize::{CollisionPolicy, Outcome, ReleaseSort};
use release_sort::print_warning;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Sort audio files into release folders based on their tags"
)]
pub struct Args {
    /// Optional input directory or zip archive
    #[arg(value_hint = clap::ValueHint::AnyPath)]
    path: Option<PathBuf>,

    /// Optional output root directory
    #[arg(short = 'o', long, value_name = "DEST", value_hint = clap::ValueHint::DirPath)]
    dest: Option<String>,

    /// Release folder name format
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Auto-confirm all prompts without asking
    #[arg(short, long)]
    auto: bool,

    /// Only print changes without moving files
    #[arg(short, long)]
    print: bool,

    /// Include files with the given extension
    #[arg(short, long = "extension", num_args = 1, action = clap::ArgAction::Append, value_name = "EXTENSION")]
    extensions: Vec<String>,

    /// What to do when a destination file already exists
    #[arg(short, long, value_enum, value_name = "POLICY")]
    collisions: Option<CollisionPolicy>,

    /// Print debug information
    #[arg(short = 'D', long)]
    debug: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, value_name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        return release_sort::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"));
    }

    let path = args.path.clone();
    let config = config::from_args(args)?;
    tracing_log::LogTracer::init().context("Failed to forward log records to tracing")?;
    let subscriber = config.log_level().subscriber();
    let outcome = tracing::subscriber::with_default(subscriber, || ReleaseSort::new(path.as_deref(), config)?.run())?;
    if let Outcome::Completed(report) = outcome
        && !report.is_success()
    {
        print_warning!("{} file(s) were left in place", report.failed.len());
    }
    Ok(())
}
