use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;
use tracing::{debug, info};

use crate::organize::{
    Config, EntryFilter, ExecutionReport, Source, Template, build_plan, confirm, execute, render, resolve_collisions,
};

/// Sort one directory or archive into release folders.
#[derive(Debug)]
pub struct ReleaseSort {
    source: Source,
    destination: PathBuf,
    template: Template,
    filter: EntryFilter,
    config: Config,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No entry needed moving.
    NothingToDo,
    /// Preview only, nothing was changed.
    DryRun,
    /// The user answered `N`.
    Declined,
    Completed(ExecutionReport),
}

impl ReleaseSort {
    /// Resolve the input and output paths and compile the folder format.
    ///
    /// # Errors
    /// Returns an error if the input path does not exist or the format is invalid.
    pub fn new(path: Option<&Path>, config: Config) -> Result<Self> {
        let input = crate::resolve_input_path(path)?;
        let destination = crate::resolve_output_path(config.dest.as_deref(), &input)?;
        let template = Template::compile(&config.format)?;
        let filter = EntryFilter::new(&config.extensions);
        let source = Source::from_path(&input);
        Ok(Self {
            source,
            destination,
            template,
            filter,
            config,
        })
    }

    /// Run interactively on standard input and output.
    ///
    /// # Errors
    /// Returns an error for any failure that aborts the whole run.
    pub fn run(&self) -> Result<Outcome> {
        let stdin = io::stdin();
        self.run_with_io(stdin.lock(), io::stdout().lock())
    }

    /// Scan, plan, preview, confirm and execute.
    ///
    /// # Errors
    /// Returns an error if the source cannot be listed, collisions abort the plan,
    /// confirmation cannot be read, or a destination directory cannot be created.
    pub fn run_with_io<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<Outcome> {
        if self.config.debug {
            writeln!(output, "{}", self.config)?;
        }
        info!(
            source = %self.source.root().display(),
            destination = %self.destination.display(),
            format = %self.template,
            "Sorting releases"
        );

        let entries = self.source.scan(&self.filter)?;
        let plan = build_plan(entries, &self.template, self.source.root(), &self.destination);
        let plan = resolve_collisions(plan, self.config.collisions, Path::exists)?;
        debug!(moves = plan.len(), directories = plan.directories().len(), "Plan ready");

        if plan.is_empty() {
            writeln!(output, "No files to move")?;
            return Ok(Outcome::NothingToDo);
        }

        writeln!(output, "{}", format!("Found {} file(s) to move:", plan.len()).bold())?;
        write!(output, "{}", render(&plan))?;

        if self.config.dryrun {
            return Ok(Outcome::DryRun);
        }

        if !confirm(self.config.auto, input, &mut output)? {
            writeln!(output, "Exiting...")?;
            return Ok(Outcome::Declined);
        }

        let report = execute(&plan, &self.source, &mut output)?;
        write_report(&report, &mut output)?;
        Ok(Outcome::Completed(report))
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

fn write_report<W: Write>(report: &ExecutionReport, output: &mut W) -> Result<()> {
    writeln!(output, "{}", format!("Moved {} file(s)", report.moved).green())?;
    if !report.is_success() {
        writeln!(output, "{}", format!("Failed to move {} file(s):", report.failed.len()).red())?;
        for (path, reason) in &report.failed {
            writeln!(output, "  {}: {reason}", path.display())?;
        }
    }
    writeln!(output, "Done")?;
    Ok(())
}
