//! End-to-end tests for scanning, planning, confirming and moving releases.

use std::fs::{self, File};
use std::io::{self, Cursor, Write};
use std::path::Path;

use tempfile::tempdir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use release_sort::organize::{
    CollisionPolicy, Config, EntryFilter, Outcome, ReleaseSort, Source, Template, build_plan, confirm, execute,
    render, resolve_collisions,
};

/// Minimal FLAC stream: stream info followed by a Vorbis comment block.
fn flac(comments: &[&str]) -> Vec<u8> {
    let vendor = b"test";
    let mut block = Vec::new();
    block.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    block.extend_from_slice(vendor);
    block.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        block.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        block.extend_from_slice(comment.as_bytes());
    }

    let mut bytes = b"fLaC".to_vec();
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 34]);
    bytes.extend_from_slice(&[0_u8; 34]);
    let length = (block.len() as u32).to_be_bytes();
    bytes.extend_from_slice(&[0x84, length[1], length[2], length[3]]);
    bytes.extend_from_slice(&block);
    bytes
}

fn write_track(dir: &Path, name: &str, comments: &[&str]) {
    fs::write(dir.join(name), flac(comments)).expect("Failed to write track");
}

fn directory_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn pipeline_moves_tracks_and_isolates_bad_entries() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_track(root, "1.flac", &["ALBUM=Night Drive", "DATE=2024"]);
    write_track(root, "2.flac", &["ALBUM=Night Drive", "DATE=2024"]);
    fs::write(root.join("3.flac"), b"fLaC garbage").unwrap();
    write_track(root, "4.flac", &["ALBUM=Night Drive", "DATE=2024"]);
    write_track(root, "5.flac", &["ALBUM=Other", "DATE=1999-01-01"]);

    let source = Source::Directory(root.to_path_buf());
    let filter = EntryFilter::new(&["flac".to_string()]);
    let template = Template::compile("{{release_name}} ({{release_year}})").unwrap();

    let plan = build_plan(source.scan(&filter).unwrap(), &template, root, root);
    let plan = resolve_collisions(plan, CollisionPolicy::Abort, Path::exists).unwrap();
    let sources: Vec<String> = plan.records().iter().map(|r| r.entry.clone()).collect();
    assert_eq!(sources, vec!["1.flac", "2.flac", "4.flac", "5.flac"]);
    assert_eq!(plan.directories().len(), 2);

    let preview = render(&plan);
    assert_eq!(preview.lines().count(), 4);

    let mut prompt = Vec::new();
    assert!(confirm(false, Cursor::new("maybe\ny\n"), &mut prompt).unwrap());

    let report = execute(&plan, &source, &mut io::sink()).unwrap();
    assert_eq!(report.moved, 4);
    assert!(report.failed.is_empty());
    assert_eq!(directory_names(root), vec!["Night Drive (2024)", "Other (1999)"]);
    assert!(root.join("3.flac").exists());
}

#[test]
fn declining_leaves_files_untouched() {
    let dir = tempdir().unwrap();
    write_track(dir.path(), "01.flac", &["ALBUM=Night Drive"]);

    let sorter = ReleaseSort::new(Some(dir.path()), Config::default()).unwrap();
    let mut output = Vec::new();
    let outcome = sorter.run_with_io(Cursor::new("x\nN\n"), &mut output).unwrap();

    assert_eq!(outcome, Outcome::Declined);
    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("Unknown response, please enter 'y' or 'N'"));
    assert!(output.contains("Exiting..."));
    assert!(directory_names(dir.path()).is_empty());
    assert!(dir.path().join("01.flac").exists());
}

#[test]
fn missing_tags_go_to_empty_release_folder() {
    let dir = tempdir().unwrap();
    write_track(dir.path(), "01.flac", &[]);

    let config = Config {
        auto: true,
        ..Config::default()
    };
    let sorter = ReleaseSort::new(Some(dir.path()), config).unwrap();
    let outcome = sorter.run_with_io(Cursor::new(""), io::sink()).unwrap();

    assert!(matches!(outcome, Outcome::Completed(ref report) if report.moved == 1));
    assert!(dir.path().join(" ()").join("01.flac").exists());
}

#[test]
fn archive_is_extracted_next_to_itself() {
    let dir = tempdir().unwrap();
    let archive_path = dir.path().join("release.zip");
    let track = flac(&["ALBUM=Night Drive", "DATE=2024-05-01", "ARTIST=A", "ARTIST=B"]);
    {
        let mut writer = ZipWriter::new(File::create(&archive_path).unwrap());
        let options = SimpleFileOptions::default();
        writer.add_directory("Release/", options).unwrap();
        writer.start_file("Release/01.flac", options).unwrap();
        writer.write_all(&track).unwrap();
        writer.start_file("Release/cover.jpg", options).unwrap();
        writer.write_all(b"jpeg").unwrap();
        writer.finish().unwrap();
    }

    let config = Config {
        auto: true,
        format: "{{release_artists}} - {{release_name}}".to_string(),
        ..Config::default()
    };
    let sorter = ReleaseSort::new(Some(&archive_path), config).unwrap();
    assert!(sorter.source().is_archive());
    let mut output = Vec::new();
    let outcome = sorter.run_with_io(Cursor::new(""), &mut output).unwrap();

    assert!(matches!(outcome, Outcome::Completed(ref report) if report.moved == 1));
    assert!(String::from_utf8(output).unwrap().contains("Extracting files..."));
    let extracted = dir.path().join("A, B - Night Drive").join("01.flac");
    assert_eq!(fs::read(extracted).unwrap(), track);
    assert!(archive_path.exists());
}

#[test]
fn skip_policy_keeps_existing_files() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_track(root, "01.flac", &["ALBUM=Album", "DATE=2020"]);
    write_track(root, "02.flac", &["ALBUM=Album", "DATE=2020"]);
    fs::create_dir(root.join("Album (2020)")).unwrap();
    fs::write(root.join("Album (2020)").join("01.flac"), "existing").unwrap();

    let config = Config {
        auto: true,
        collisions: CollisionPolicy::Skip,
        ..Config::default()
    };
    let sorter = ReleaseSort::new(Some(root), config).unwrap();
    let outcome = sorter.run_with_io(Cursor::new(""), io::sink()).unwrap();

    assert!(matches!(outcome, Outcome::Completed(ref report) if report.moved == 1));
    assert_eq!(fs::read_to_string(root.join("Album (2020)").join("01.flac")).unwrap(), "existing");
    assert!(root.join("01.flac").exists());
    assert!(root.join("Album (2020)").join("02.flac").exists());
}
