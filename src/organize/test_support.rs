//! Fixture builders shared by the unit tests.

use std::fs::File;
use std::path::Path;

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::organize::Metadata;

/// Build a Vorbis comment block body.
fn comment_block(comments: &[&str]) -> Vec<u8> {
    let vendor = b"reference libFLAC 1.4.3";
    let mut block = Vec::new();
    block.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    block.extend_from_slice(vendor);
    block.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        block.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        block.extend_from_slice(comment.as_bytes());
    }
    block
}

fn block_header(block_type: u8, is_last: bool, length: usize) -> [u8; 4] {
    let length = (length as u32).to_be_bytes();
    let flag = if is_last { 0x80 } else { 0 };
    [flag | block_type, length[1], length[2], length[3]]
}

/// Build a minimal FLAC stream with a stream info block, a padding block,
/// and a comment block holding the given comments.
pub fn flac_bytes(comments: &[&str]) -> Vec<u8> {
    let mut bytes = b"fLaC".to_vec();
    bytes.extend_from_slice(&block_header(0, false, 34));
    bytes.extend_from_slice(&[0_u8; 34]);
    bytes.extend_from_slice(&block_header(1, false, 8));
    bytes.extend_from_slice(&[0_u8; 8]);
    let block = comment_block(comments);
    bytes.extend_from_slice(&block_header(4, true, block.len()));
    bytes.extend_from_slice(&block);
    bytes
}

/// Build a FLAC stream whose only metadata block is stream info.
pub fn flac_without_comments() -> Vec<u8> {
    let mut bytes = b"fLaC".to_vec();
    bytes.extend_from_slice(&block_header(0, true, 34));
    bytes.extend_from_slice(&[0_u8; 34]);
    bytes
}

/// Build an untagged PCM WAV file holding four silent samples.
pub fn pcm_wav_bytes() -> Vec<u8> {
    let mut format = Vec::new();
    format.extend_from_slice(&1_u16.to_le_bytes());
    format.extend_from_slice(&1_u16.to_le_bytes());
    format.extend_from_slice(&8000_u32.to_le_bytes());
    format.extend_from_slice(&16000_u32.to_le_bytes());
    format.extend_from_slice(&2_u16.to_le_bytes());
    format.extend_from_slice(&16_u16.to_le_bytes());
    let data = [0_u8; 8];

    let mut body = b"WAVE".to_vec();
    body.extend_from_slice(b"fmt ");
    body.extend_from_slice(&(format.len() as u32).to_le_bytes());
    body.extend_from_slice(&format);
    body.extend_from_slice(b"data");
    body.extend_from_slice(&(data.len() as u32).to_le_bytes());
    body.extend_from_slice(&data);

    let mut bytes = b"RIFF".to_vec();
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&body);
    bytes
}

/// Write a zip archive. Entries with `None` content are directories.
pub fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
    use std::io::Write;

    let file = File::create(path).expect("Failed to create zip file");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in entries {
        match content {
            Some(bytes) => {
                writer.start_file(*name, options).expect("Failed to start zip entry");
                writer.write_all(bytes).expect("Failed to write zip entry");
            }
            None => writer.add_directory(*name, options).expect("Failed to add zip directory"),
        }
    }
    writer.finish().expect("Failed to finish zip file");
}

/// In-memory tags for planning tests.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    pub album: String,
    pub year: i32,
    pub date: String,
    pub artists: Vec<String>,
}

impl StaticMetadata {
    pub fn release(album: &str, year: i32) -> Self {
        Self {
            album: album.to_string(),
            year,
            ..Self::default()
        }
    }
}

impl Metadata for StaticMetadata {
    fn album(&self) -> String {
        self.album.clone()
    }

    fn year(&self) -> i32 {
        self.year
    }

    fn release_date(&self) -> String {
        self.date.clone()
    }

    fn artists(&self) -> Vec<String> {
        self.artists.clone()
    }

    fn raw(&self) -> Vec<(String, String)> {
        vec![("album".to_string(), self.album.clone())]
    }
}
