use std::fs::File;
use std::io::Write;
use std::path::Path;

use comicinfo_core::fs::{Archiver, FolderArchiver, UnsupportedArchiver, ZipArchiver, open_archive};
use comicinfo_core::meta::{COMIC_INFO_FILENAME, ComicInfoXml, MetadataProvider};
use comicinfo_core::types::{ArchiveKind, Credit, GenericMetadata};
use tempfile::tempdir;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

fn create_cbz(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn sample() -> GenericMetadata {
    let mut md = GenericMetadata::default();
    md.series = Some("Saga".to_string());
    md.issue = Some("1".to_string());
    md.add_credit("Brian K. Vaughan", "Writer");
    md
}

#[test]
fn zip_archive_without_metadata_reads_blank_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.cbz");
    create_cbz(&path, &[("001.png", "png")]);

    let archive = ZipArchiver::open(&path).unwrap();
    let provider = ComicInfoXml::new();
    assert!(provider.supports_metadata(&archive));
    assert!(!provider.has_metadata(&archive).unwrap());

    let md = provider.get_metadata(&archive).unwrap();
    assert!(md.is_empty);
    assert_eq!(provider.get_metadata_string(&archive).unwrap(), "");
    assert!(!provider.remove_metadata(&archive).unwrap());
}

#[test]
fn zip_archive_set_get_remove_cycle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.cbz");
    create_cbz(&path, &[("001.png", "png"), ("002.png", "png")]);

    let archive = open_archive(&path).unwrap();
    let provider = ComicInfoXml::new();

    assert!(provider.set_metadata(&sample(), archive.as_ref()).unwrap());
    assert!(provider.has_metadata(archive.as_ref()).unwrap());

    let md = provider.get_metadata(archive.as_ref()).unwrap();
    assert!(!md.is_empty);
    assert_eq!(md.series.as_deref(), Some("Saga"));
    assert_eq!(md.credits, vec![Credit::new("Brian K. Vaughan", "Writer")]);

    let text = provider.get_metadata_string(archive.as_ref()).unwrap();
    assert!(text.contains("<Series>Saga</Series>"));

    assert!(provider.remove_metadata(archive.as_ref()).unwrap());
    assert!(!provider.has_metadata(archive.as_ref()).unwrap());
    assert_eq!(archive.get_filename_list().unwrap(), vec!["001.png", "002.png"]);
}

#[test]
fn set_metadata_merges_with_stored_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.cbz");
    let stored = "<ComicInfo><Series>Old</Series><Review>Great</Review></ComicInfo>";
    create_cbz(&path, &[("001.png", "png"), (COMIC_INFO_FILENAME, stored)]);

    let archive = ZipArchiver::open(&path).unwrap();
    let provider = ComicInfoXml::new();
    assert!(provider.set_metadata(&sample(), &archive).unwrap());

    let text = String::from_utf8(archive.read_file(COMIC_INFO_FILENAME).unwrap()).unwrap();
    assert!(text.contains("<Review>Great</Review>"));
    assert!(text.contains("<Series>Saga</Series>"));
    assert!(!text.contains("Old"));
}

#[test]
fn foreign_entry_is_not_metadata_and_is_overwritten() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.cbz");
    create_cbz(&path, &[(COMIC_INFO_FILENAME, "<Other><Series>X</Series></Other>")]);

    let archive = ZipArchiver::open(&path).unwrap();
    let provider = ComicInfoXml::new();
    assert!(!provider.has_metadata(&archive).unwrap());
    assert!(provider.get_metadata(&archive).unwrap().is_empty);
    assert!(!provider.remove_metadata(&archive).unwrap());

    assert!(provider.set_metadata(&sample(), &archive).unwrap());
    let text = String::from_utf8(archive.read_file(COMIC_INFO_FILENAME).unwrap()).unwrap();
    assert!(text.contains("<ComicInfo"));
    assert!(!text.contains("<Other"));
}

#[test]
fn folder_archive_round_trip_with_custom_filename() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("001.jpg"), b"jpg").unwrap();

    let archive = FolderArchiver::open(dir.path()).unwrap();
    let provider = ComicInfoXml::new().with_filename("meta/ComicInfo.xml");

    assert!(provider.set_metadata(&sample(), &archive).unwrap());
    assert!(dir.path().join("meta").join("ComicInfo.xml").exists());
    assert_eq!(provider.get_metadata(&archive).unwrap().series.as_deref(), Some("Saga"));
}

#[test]
fn unsupported_archive_is_a_soft_failure() {
    let archive = UnsupportedArchiver::new("book.cbr", ArchiveKind::Rar);
    let provider = ComicInfoXml::new();

    assert!(!provider.supports_metadata(&archive));
    assert!(!provider.has_metadata(&archive).unwrap());
    assert!(!provider.set_metadata(&sample(), &archive).unwrap());
    assert!(provider.get_metadata(&archive).unwrap().is_empty);
}
