//! Folder name templates.
//!
//! A template is plain text with any number of placeholders:
//!
//! | Placeholder           | Value                                   |
//! |-----------------------|-----------------------------------------|
//! | `{{release_name}}`    | Album / release name                    |
//! | `{{release_year}}`    | Release year as an integer, `0` if none |
//! | `{{release_date}}`    | Release date string, may be empty       |
//! | `{{release_artists}}` | Artists joined with `", "`              |
//!
//! Anything else, including unknown `{{...}}` tokens, is copied verbatim.
//!
//! ```rust
//! use release_sort::organize::{Metadata, Template};
//!
//! struct Release;
//!
//! impl Metadata for Release {
//!     fn album(&self) -> String {
//!         "Night Drive".to_string()
//!     }
//!     fn year(&self) -> i32 {
//!         2024
//!     }
//!     fn release_date(&self) -> String {
//!         String::new()
//!     }
//!     fn artists(&self) -> Vec<String> {
//!         Vec::new()
//!     }
//!     fn raw(&self) -> Vec<(String, String)> {
//!         Vec::new()
//!     }
//! }
//!
//! let template = Template::compile("{{release_name}} ({{release_year}})").unwrap();
//! assert_eq!(template.format(&Release), "Night Drive (2024)");
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::organize::Metadata;

/// Separator used when rendering multiple artists.
pub const ARTIST_SEPARATOR: &str = ", ";

/// Errors for templates that can never produce a usable folder name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Folder format is empty")]
    Empty,

    #[error("Folder format must be a relative path: '{0}'")]
    Absolute(String),
}

/// Recognized template placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    ReleaseName,
    ReleaseYear,
    ReleaseDate,
    ReleaseArtists,
}

impl Placeholder {
    /// All placeholders in match priority order.
    ///
    /// No token is a prefix of another, so the order only matters for speed.
    pub const ALL: [Self; 4] = [
        Self::ReleaseArtists,
        Self::ReleaseName,
        Self::ReleaseYear,
        Self::ReleaseDate,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::ReleaseName => "{{release_name}}",
            Self::ReleaseYear => "{{release_year}}",
            Self::ReleaseDate => "{{release_date}}",
            Self::ReleaseArtists => "{{release_artists}}",
        }
    }

    /// Find the longest placeholder token at the start of `text`.
    fn match_start(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .filter(|placeholder| text.starts_with(placeholder.token()))
            .max_by_key(|placeholder| placeholder.token().len())
            .copied()
    }

    /// Render the value bound to this placeholder.
    fn render(self, metadata: &dyn Metadata, output: &mut String) {
        match self {
            Self::ReleaseName => output.push_str(&metadata.album()),
            Self::ReleaseYear => output.push_str(&metadata.year().to_string()),
            Self::ReleaseDate => output.push_str(&metadata.release_date()),
            Self::ReleaseArtists => output.push_str(&metadata.artists().join(ARTIST_SEPARATOR)),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Value(Placeholder),
}

/// A compiled folder name template.
///
/// Compiling once and calling [`format`](Self::format) per entry avoids
/// rescanning the format string for every file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Compile a format string.
    ///
    /// # Errors
    /// Returns an error if the format is blank or starts with a root or prefix,
    /// since joining it to the destination would escape the destination directory.
    pub fn compile(format: &str) -> Result<Self, TemplateError> {
        if format.trim().is_empty() {
            return Err(TemplateError::Empty);
        }
        if Path::new(format).has_root() || Path::new(format).is_absolute() {
            return Err(TemplateError::Absolute(format.to_string()));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = format;
        while let Some(next) = rest.chars().next() {
            if let Some(placeholder) = Placeholder::match_start(rest) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Value(placeholder));
                rest = &rest[placeholder.token().len()..];
            } else {
                literal.push(next);
                rest = &rest[next.len_utf8()..];
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: format.to_string(),
            segments,
        })
    }

    /// Render the folder name for the given metadata.
    #[must_use]
    pub fn format(&self, metadata: &dyn Metadata) -> String {
        let mut output = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Value(placeholder) => placeholder.render(metadata, &mut output),
            }
        }
        output
    }

    /// Placeholders used by this template in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Value(placeholder) => Some(*placeholder),
            Segment::Literal(_) => None,
        })
    }

    /// The original format string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
