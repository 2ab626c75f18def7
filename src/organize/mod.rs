//! Sort audio files into release folders named from their tags.
//!
//! A run goes through these steps in order:
//! 1. [`Source::scan`] reads tags for each entry in a directory or zip archive.
//! 2. [`build_plan`] names a destination for every entry using a [`Template`].
//! 3. [`resolve_collisions`] applies the [`CollisionPolicy`].
//! 4. [`render`] and [`confirm`] show the plan and ask before changing anything.
//! 5. [`execute`] creates the release folders and moves or extracts the files.
//!
//! [`ReleaseSort`] ties the steps together for the command line tool.

mod config;
mod execute;
mod metadata;
mod organizer;
mod plan;
mod preview;
mod scan;
mod template;

#[cfg(test)]
mod test_support;

pub use config::{Config, DEFAULT_EXTENSIONS, DEFAULT_FORMAT, LogLevel};
pub use execute::{ExecutionReport, execute};
pub use metadata::{Metadata, MetadataError, TagMetadata, VorbisComments, read_metadata};
pub use organizer::{Outcome, ReleaseSort};
pub use plan::{Collision, CollisionPolicy, MovePlan, MoveRecord, build_plan, resolve_collisions};
pub use preview::{ARROW, confirm, render};
pub use scan::{EntryFilter, ScannedEntry, Source};
pub use template::{ARTIST_SEPARATOR, Placeholder, Template, TemplateError};
