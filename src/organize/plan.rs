//! Move plan construction.
//!
//! Planning is pure: it only joins paths computed from already-read metadata.
//! Checking the destinations against the filesystem is a separate step,
//! see [`resolve_collisions`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::organize::{ScannedEntry, Template};

/// A single planned move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Entry name relative to the source root.
    pub entry: String,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// All moves for one run, sorted by source path,
/// together with the directories they need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovePlan {
    records: Vec<MoveRecord>,
    directories: BTreeSet<PathBuf>,
}

/// What to do when a destination path is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Fail the run and list every collision.
    #[default]
    Abort,
    /// Leave colliding files where they are.
    Skip,
    /// Replace existing files.
    Overwrite,
}

/// A destination path claimed by more than one source, or already present on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub destination: PathBuf,
    pub sources: Vec<PathBuf>,
    pub exists: bool,
}

/// Build the plan for scanned entries.
///
/// Each entry goes to `destination_root / template(metadata) / base name`.
/// Entries already at their destination are left out.
pub fn build_plan<I>(entries: I, template: &Template, source_root: &Path, destination_root: &Path) -> MovePlan
where
    I: IntoIterator<Item = ScannedEntry>,
{
    let mut records = Vec::new();
    let mut directories = BTreeSet::new();

    for ScannedEntry { name, metadata } in entries {
        let Some(file_name) = Path::new(&name).file_name() else {
            warn!(name = %name, "Entry has no file name, skipping");
            continue;
        };
        let directory = release_directory(destination_root, &template.format(metadata.as_ref()));
        let source = source_root.join(&name);
        let destination = directory.join(file_name);
        if source == destination {
            debug!(path = %source.display(), "Already in release folder, skipping");
            continue;
        }
        directories.insert(directory);
        records.push(MoveRecord {
            entry: name,
            source,
            destination,
        });
    }

    records.sort_by(|a, b| a.source.as_os_str().cmp(b.source.as_os_str()));
    MovePlan { records, directories }
}

/// Join a rendered folder name under the destination root.
///
/// Only plain name segments are kept, so root, prefix, `.` and `..` parts
/// coming from tag values cannot point outside of `destination_root`.
fn release_directory(destination_root: &Path, folder: &str) -> PathBuf {
    let mut directory = destination_root.to_path_buf();
    for component in Path::new(folder).components() {
        if let Component::Normal(part) = component {
            directory.push(part);
        }
    }
    directory
}

impl MovePlan {
    /// Moves in execution order.
    #[must_use]
    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    /// Unique destination directories.
    #[must_use]
    pub const fn directories(&self) -> &BTreeSet<PathBuf> {
        &self.directories
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep only the records matching the predicate and recompute the directory set.
    pub fn retain<F>(&mut self, predicate: F)
    where
        F: FnMut(&MoveRecord) -> bool,
    {
        self.records.retain(predicate);
        self.directories = self
            .records
            .iter()
            .filter_map(|record| record.destination.parent().map(Path::to_path_buf))
            .collect();
    }

    /// Find destinations used by several records or already present.
    ///
    /// `exists` is called once per distinct destination.
    pub fn find_collisions<F>(&self, mut exists: F) -> Vec<Collision>
    where
        F: FnMut(&Path) -> bool,
    {
        let mut by_destination: BTreeMap<&Path, Vec<PathBuf>> = BTreeMap::new();
        for record in &self.records {
            by_destination
                .entry(record.destination.as_path())
                .or_default()
                .push(record.source.clone());
        }

        by_destination
            .into_iter()
            .filter_map(|(destination, sources)| {
                let exists = exists(destination);
                (exists || sources.len() > 1).then(|| Collision {
                    destination: destination.to_path_buf(),
                    sources,
                    exists,
                })
            })
            .collect()
    }
}

/// Apply the collision policy to the plan.
///
/// # Errors
/// Returns an error listing every collision when the policy is [`CollisionPolicy::Abort`].
pub fn resolve_collisions<F>(mut plan: MovePlan, policy: CollisionPolicy, exists: F) -> anyhow::Result<MovePlan>
where
    F: FnMut(&Path) -> bool,
{
    let collisions = plan.find_collisions(exists);
    if collisions.is_empty() {
        return Ok(plan);
    }

    match policy {
        CollisionPolicy::Abort => {
            let report = collisions.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
            anyhow::bail!(
                "Found {} destination collision(s), nothing was moved:\n{report}",
                collisions.len()
            );
        }
        CollisionPolicy::Skip => {
            // Records are sorted by source, so the first source of an in-plan duplicate is kept.
            let mut dropped: BTreeSet<PathBuf> = BTreeSet::new();
            for collision in &collisions {
                let keep = usize::from(!collision.exists);
                for source in collision.sources.iter().skip(keep) {
                    warn!(
                        path = %source.display(),
                        destination = %collision.destination.display(),
                        "Destination is taken, skipping"
                    );
                    dropped.insert(source.clone());
                }
            }
            plan.retain(|record| !dropped.contains(&record.source));
        }
        CollisionPolicy::Overwrite => {
            for collision in &collisions {
                debug!(destination = %collision.destination.display(), "Destination will be overwritten");
            }
        }
    }
    Ok(plan)
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.destination.display())?;
        if self.exists {
            write!(f, " (already exists)")?;
        }
        for source in &self.sources {
            write!(f, "\n  <- {}", source.display())?;
        }
        Ok(())
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
        };
        write!(f, "{name}")
    }
}
