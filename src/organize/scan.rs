//! Entry enumeration for directory and archive sources.

use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{Level, debug, warn};
use zip::ZipArchive;

use crate::organize::{Metadata, read_metadata};

/// Where the entries to sort come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Immediate children of a directory.
    Directory(PathBuf),
    /// Entries of a zip archive.
    Archive(PathBuf),
}

/// One entry with its tags.
pub struct ScannedEntry {
    /// Entry name relative to the source root.
    /// For archives this is the full entry name, which may contain `/`.
    pub name: String,
    pub metadata: Box<dyn Metadata>,
}

/// Decides which entries are worth opening.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Lowercase extensions without a leading dot. Empty accepts every extension.
    extensions: Vec<String>,
}

impl Source {
    /// Archive for `.zip` files, directory otherwise.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path.is_file() && crate::path_to_file_extension_string(path) == "zip" {
            Self::Archive(path.to_path_buf())
        } else {
            Self::Directory(path.to_path_buf())
        }
    }

    /// Root path that entry names are relative to.
    #[must_use]
    pub fn root(&self) -> &Path {
        match self {
            Self::Directory(path) | Self::Archive(path) => path,
        }
    }

    #[must_use]
    pub const fn is_archive(&self) -> bool {
        matches!(self, Self::Archive(_))
    }

    /// Start a single pass over the source.
    ///
    /// Entries that cannot be opened or whose tags cannot be read are logged and skipped.
    ///
    /// # Errors
    /// Returns an error if the directory listing or archive index cannot be read.
    pub fn scan<'a>(&self, filter: &'a EntryFilter) -> Result<Box<dyn Iterator<Item = ScannedEntry> + 'a>> {
        match self {
            Self::Directory(path) => Ok(Box::new(DirectoryScanner::new(path, filter)?)),
            Self::Archive(path) => Ok(Box::new(ArchiveScanner::new(path, filter)?)),
        }
    }
}

impl EntryFilter {
    #[must_use]
    pub fn new(extensions: &[String]) -> Self {
        let extensions = extensions
            .iter()
            .map(|extension| extension.trim().trim_start_matches('.').to_lowercase())
            .filter(|extension| !extension.is_empty())
            .collect();
        Self { extensions }
    }

    /// Check the base name of an entry.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        let path = Path::new(name);
        let file_name = crate::path_to_filename_string(path);
        if file_name.is_empty() || crate::is_hidden_name(&file_name) {
            return false;
        }
        if self.extensions.is_empty() {
            return true;
        }
        let extension = crate::path_to_file_extension_string(path);
        self.extensions.iter().any(|e| *e == extension)
    }
}

/// Lazily reads tags for the files in one directory.
struct DirectoryScanner<'a> {
    entries: fs::ReadDir,
    filter: &'a EntryFilter,
}

impl<'a> DirectoryScanner<'a> {
    fn new(root: &Path, filter: &'a EntryFilter) -> Result<Self> {
        let entries =
            fs::read_dir(root).with_context(|| format!("Failed to read source directory: {}", root.display()))?;
        Ok(Self { entries, filter })
    }

    fn read_entry(&self, path: &Path, name: String) -> Option<ScannedEntry> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(error) => {
                warn!(path = %path.display(), %error, "Error opening file");
                return None;
            }
        };
        // The file handle is dropped at the end of this function whether or not the tags parse.
        match read_metadata(BufReader::new(file)) {
            Ok(metadata) => {
                log_raw_tags(&name, metadata.as_ref());
                Some(ScannedEntry { name, metadata })
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Error reading tags");
                None
            }
        }
    }
}

impl Iterator for DirectoryScanner<'_> {
    type Item = ScannedEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(%error, "Error reading directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let name = crate::os_str_to_string(&entry.file_name());
            debug!(name = %name, is_dir = path.is_dir(), "Checking file");

            if path.is_dir() {
                debug!(name = %name, "Entry is a directory, skipping");
                continue;
            }
            if !self.filter.accepts(&name) {
                debug!(name = %name, "Entry does not match filter, skipping");
                continue;
            }
            if let Some(scanned) = self.read_entry(&path, name) {
                return Some(scanned);
            }
        }
    }
}

/// Lazily reads tags for the files inside a zip archive.
struct ArchiveScanner<'a> {
    archive: ZipArchive<BufReader<File>>,
    index: usize,
    filter: &'a EntryFilter,
}

impl<'a> ArchiveScanner<'a> {
    fn new(path: &Path, filter: &'a EntryFilter) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open archive: {}", path.display()))?;
        let archive = ZipArchive::new(BufReader::new(file))
            .with_context(|| format!("Failed to read archive: {}", path.display()))?;
        Ok(Self {
            archive,
            index: 0,
            filter,
        })
    }

    /// Read the entry at `index` into memory, since zip entries cannot seek.
    fn read_entry_bytes(&mut self, index: usize) -> Option<(String, Vec<u8>)> {
        let mut file = match self.archive.by_index(index) {
            Ok(file) => file,
            Err(error) => {
                warn!(index, %error, "Error opening archive entry");
                return None;
            }
        };
        let name = file.name().to_string();
        if file.is_dir() {
            debug!(name = %name, "Skipping directory");
            return None;
        }
        if !self.filter.accepts(&name) {
            debug!(name = %name, "Entry does not match filter, skipping");
            return None;
        }

        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        if let Err(error) = file.read_to_end(&mut bytes) {
            warn!(path = %name, %error, "Error reading archive entry");
            return None;
        }
        Some((name, bytes))
    }
}

impl Iterator for ArchiveScanner<'_> {
    type Item = ScannedEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.archive.len() {
            let index = self.index;
            self.index += 1;

            let Some((name, bytes)) = self.read_entry_bytes(index) else {
                continue;
            };
            match read_metadata(Cursor::new(bytes)) {
                Ok(metadata) => {
                    log_raw_tags(&name, metadata.as_ref());
                    return Some(ScannedEntry { name, metadata });
                }
                Err(error) => warn!(path = %name, %error, "Error reading tags"),
            }
        }
        None
    }
}

/// Dump all tags of an entry when debug logging is on.
fn log_raw_tags(name: &str, metadata: &dyn Metadata) {
    if tracing::enabled!(Level::DEBUG) {
        debug!(name, "Read tags");
        for (key, value) in metadata.raw() {
            debug!(name, key = %key, value = %value, "Tag");
        }
    }
}
