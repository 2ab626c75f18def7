//! Tag reading for audio entries.
//!
//! FLAC files are read as their Vorbis comment block of `key=value` strings,
//! other formats as the primary `lofty` tag.
//! Both sources end up behind the same [`Metadata`] accessors
//! and look up the release date from the same ordered list of keys.

use std::io::{Read, Seek};

use lofty::config::ParseOptions;
use lofty::file::{AudioFile, FileType, TaggedFile, TaggedFileExt};
use lofty::flac::FlacFile;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt metadata: {0}")]
    CorruptMetadata(String),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

/// Read-only view over the tags of one entry.
///
/// Missing values never fail: album and date are empty,
/// year is zero, and artists is an empty list.
pub trait Metadata {
    /// Album or release name.
    fn album(&self) -> String;

    /// Release year.
    fn year(&self) -> i32;

    /// Release date as written in the tags.
    fn release_date(&self) -> String;

    /// Track artists in tag order.
    fn artists(&self) -> Vec<String>;

    /// All tag keys and values for diagnostics.
    fn raw(&self) -> Vec<(String, String)>;
}

/// Tags from a FLAC Vorbis comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VorbisComments {
    pub vendor: String,
    /// Comments in file order with lowercase keys.
    pub comments: Vec<(String, String)>,
}

/// Tags read through the generic `lofty` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMetadata {
    album: Option<String>,
    year: Option<u32>,
    release_date: Option<String>,
    artists: Vec<String>,
    raw: Vec<(String, String)>,
}

/// Release date sources in priority order,
/// as the Vorbis comment key and the matching generic tag key.
fn release_date_keys() -> [(&'static str, ItemKey); 4] {
    [
        ("release_time", ItemKey::Unknown("RELEASE_TIME".to_string())),
        ("releasedate", ItemKey::ReleaseDate),
        ("date", ItemKey::RecordingDate),
        ("originaldate", ItemKey::OriginalReleaseDate),
    ]
}

/// Read tags from an opened entry.
///
/// # Errors
/// Returns [`MetadataError::UnsupportedFormat`] if the data is not a known audio format,
/// and [`MetadataError::CorruptMetadata`] if the tags cannot be parsed.
pub fn read_metadata<R: Read + Seek>(reader: R) -> Result<Box<dyn Metadata>> {
    let probe = Probe::new(reader)
        .guess_file_type()
        .map_err(|e| MetadataError::CorruptMetadata(e.to_string()))?;

    match probe.file_type() {
        Some(FileType::Flac) => Ok(Box::new(VorbisComments::read_flac(&mut probe.into_inner())?)),
        Some(_) => {
            let tagged_file = probe.read().map_err(map_lofty_error)?;
            Ok(Box::new(TagMetadata::from_tagged_file(&tagged_file)))
        }
        None => Err(MetadataError::UnsupportedFormat("unknown file type".to_string())),
    }
}

fn map_lofty_error(error: lofty::error::LoftyError) -> MetadataError {
    match error.kind() {
        lofty::error::ErrorKind::UnknownFormat => MetadataError::UnsupportedFormat(error.to_string()),
        _ => MetadataError::CorruptMetadata(error.to_string()),
    }
}

impl VorbisComments {
    /// Read the Vorbis comment block of a FLAC stream.
    ///
    /// A stream without a comment block yields empty tags.
    /// Comments without a `=` separator are dropped with a warning from `lofty`.
    ///
    /// # Errors
    /// Returns an error if the stream is not FLAC or a metadata block is truncated or invalid.
    pub fn read_flac<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let flac = FlacFile::read_from(reader, ParseOptions::new()).map_err(map_lofty_error)?;
        Ok(flac.vorbis_comments().map(Self::from_lofty).unwrap_or_default())
    }

    fn from_lofty(tag: &lofty::ogg::VorbisComments) -> Self {
        Self {
            vendor: tag.vendor().to_string(),
            comments: tag
                .items()
                .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
                .collect(),
        }
    }

    /// Last value for the given lowercase key.
    fn get(&self, key: &str) -> Option<&str> {
        self.comments
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Metadata for VorbisComments {
    fn album(&self) -> String {
        self.get("album").unwrap_or_default().to_string()
    }

    fn year(&self) -> i32 {
        self.get("year")
            .and_then(|year| year.trim().parse().ok())
            .or_else(|| parse_year(&self.release_date()))
            .unwrap_or_default()
    }

    fn release_date(&self) -> String {
        release_date_keys()
            .iter()
            .find_map(|(key, _)| self.get(key))
            .unwrap_or_default()
            .to_string()
    }

    fn artists(&self) -> Vec<String> {
        self.comments
            .iter()
            .filter(|(key, _)| key == "artist")
            .map(|(_, value)| value.clone())
            .collect()
    }

    fn raw(&self) -> Vec<(String, String)> {
        self.comments.clone()
    }
}

impl TagMetadata {
    /// Probe the stream with `lofty` and copy out the tag values.
    ///
    /// A file without any tags yields empty values.
    ///
    /// # Errors
    /// Returns an error if the format is unknown or the file cannot be parsed.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
        let tagged_file = Probe::new(reader)
            .guess_file_type()
            .map_err(|e| MetadataError::CorruptMetadata(e.to_string()))?
            .read()
            .map_err(map_lofty_error)?;
        Ok(Self::from_tagged_file(&tagged_file))
    }

    fn from_tagged_file(tagged_file: &TaggedFile) -> Self {
        tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .map(Self::from_tag)
            .unwrap_or_default()
    }

    fn from_tag(tag: &Tag) -> Self {
        let release_date = release_date_keys()
            .iter()
            .find_map(|(_, key)| tag.get_string(key))
            .map(ToString::to_string);

        let raw = tag
            .items()
            .filter_map(|item| {
                item.value()
                    .text()
                    .map(|text| (format!("{:?}", item.key()), text.to_string()))
            })
            .collect();

        Self {
            album: tag.album().map(|album| album.to_string()),
            year: tag.year(),
            release_date,
            artists: tag.get_strings(&ItemKey::TrackArtist).map(ToString::to_string).collect(),
            raw,
        }
    }
}

impl Metadata for TagMetadata {
    fn album(&self) -> String {
        self.album.clone().unwrap_or_default()
    }

    fn year(&self) -> i32 {
        self.year
            .and_then(|year| i32::try_from(year).ok())
            .or_else(|| self.release_date.as_deref().and_then(parse_year))
            .unwrap_or_default()
    }

    fn release_date(&self) -> String {
        self.release_date.clone().unwrap_or_default()
    }

    fn artists(&self) -> Vec<String> {
        self.artists.clone()
    }

    fn raw(&self) -> Vec<(String, String)> {
        self.raw.clone()
    }
}

/// Parse the leading four-digit year from a date string like `2024-03-14`.
fn parse_year(date: &str) -> Option<i32> {
    let date = date.trim();
    let digits = date.get(..4)?;
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}
