//! Plan execution.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::organize::{MovePlan, MoveRecord, Source};

/// Outcome of executing a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Number of completed moves or extractions.
    pub moved: usize,
    /// Source path and reason for every record that failed.
    pub failed: Vec<(PathBuf, String)>,
}

impl ExecutionReport {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, record: &MoveRecord, result: io::Result<()>) {
        match result {
            Ok(()) => {
                info!(from = %record.source.display(), to = %record.destination.display(), "Moved");
                self.moved += 1;
            }
            Err(error) => {
                warn!(path = %record.source.display(), %error, "Failed to move file");
                self.failed.push((record.source.clone(), error.to_string()));
            }
        }
    }
}

/// Create all directories, then move or extract every record in order.
///
/// Phase headings are written to `progress`.
/// A failure on one record is recorded in the report and does not stop the batch.
///
/// # Errors
/// Returns an error before anything is moved if the archive cannot be opened
/// or a destination directory cannot be created.
pub fn execute<W: Write>(plan: &MovePlan, source: &Source, progress: &mut W) -> Result<ExecutionReport> {
    let mut archive = match source {
        Source::Archive(path) => Some(open_archive(path)?),
        Source::Directory(_) => None,
    };

    writeln!(progress, "Creating new directories...")?;
    create_directories(plan)?;

    if archive.is_some() {
        writeln!(progress, "Extracting files...")?;
    } else {
        writeln!(progress, "Moving files...")?;
    }

    let mut report = ExecutionReport::default();
    for record in plan.records() {
        let result = match archive.as_mut() {
            Some(archive) => extract(archive, record),
            None => fs::rename(&record.source, &record.destination),
        };
        report.record(record, result);
    }
    Ok(report)
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Failed to open archive: {}", path.display()))?;
    ZipArchive::new(BufReader::new(file)).with_context(|| format!("Failed to read archive: {}", path.display()))
}

fn create_directories(plan: &MovePlan) -> Result<()> {
    for directory in plan.directories() {
        debug!(path = %directory.display(), "Creating directory");
        fs::create_dir_all(directory)
            .with_context(|| format!("Failed to create directory: {}", directory.display()))?;
    }
    Ok(())
}

/// Copy one archive entry to its destination, removing the partial file on failure.
fn extract(archive: &mut ZipArchive<BufReader<File>>, record: &MoveRecord) -> io::Result<()> {
    let mut entry = archive.by_name(&record.entry).map_err(io::Error::other)?;
    let mut output = File::create(&record.destination)?;
    if let Err(error) = io::copy(&mut entry, &mut output) {
        drop(output);
        if let Err(remove_error) = fs::remove_file(&record.destination) {
            debug!(path = %record.destination.display(), error = %remove_error, "Failed to remove partial file");
        }
        return Err(error);
    }
    Ok(())
}
