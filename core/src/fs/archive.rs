//! ZIP/CBZ archive handling.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Error, anyhow};
use tempfile::NamedTempFile;
use tracing::debug;
use zip::CompressionMethod;
use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};

use super::{Archiver, Result, util};

/// A CBZ or plain ZIP archive on disk.
///
/// The archive is reopened for every operation. Writes and removals rebuild the archive in a
/// temporary file next to it, copying untouched entries without recompressing them, and then
/// atomically replace the original.
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    path: PathBuf,
}

impl ZipArchiver {
    pub fn open(path: &Path) -> Result<Self> {
        let archiver = Self { path: path.to_path_buf() };
        archiver.reader()?;
        Ok(archiver)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> Result<ZipArchive<File>> {
        let file =
            File::open(&self.path).with_context(|| format!("opening archive {:?}", self.path))?;
        ZipArchive::new(file).map_err(|err| anyhow!("reading archive {:?}: {}", self.path, err))
    }

    /// Rebuild the archive without `target`, appending `replacement` under that name if given.
    ///
    /// Returns whether `target` existed. Nothing is written when there is nothing to change.
    fn rewrite(&self, target: &str, replacement: Option<&[u8]>) -> Result<bool> {
        let mut archive = self.reader()?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(parent)
            .with_context(|| format!("allocating temp file in {}", parent.display()))?;

        let mut found = false;
        {
            let mut writer = ZipWriter::new(temp.as_file_mut());
            for idx in 0..archive.len() {
                let file = archive.by_index(idx).map_err(|err| anyhow!("{}", err))?;
                if file.name() == target {
                    found = true;
                    continue;
                }
                writer.raw_copy_file(file).map_err(|err| anyhow!("{}", err))?;
            }

            if let Some(data) = replacement {
                let options =
                    FileOptions::default().compression_method(CompressionMethod::Deflated);
                writer.start_file(target, options).map_err(|err| anyhow!("{}", err))?;
                writer.write_all(data).with_context(|| format!("writing {target}"))?;
            }
            writer.finish().map_err(|err| anyhow!("{}", err))?;
        }

        if !found && replacement.is_none() {
            return Ok(false);
        }

        temp.persist(&self.path).map_err(|err| Error::from(err.error))?;
        debug!(target: "fs::archive", "rewrote {:?} ({target})", self.path);
        Ok(found)
    }
}

impl Archiver for ZipArchiver {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn supports_files(&self) -> bool {
        true
    }

    fn get_filename_list(&self) -> Result<Vec<String>> {
        let mut archive = self.reader()?;
        let mut names = Vec::new();

        for idx in 0..archive.len() {
            let file = archive.by_index(idx).map_err(|err| anyhow!("{}", err))?;
            if file.is_dir() {
                continue;
            }
            names.push(file.name().to_string());
        }

        names.sort_by(|a, b| util::natural_cmp(a, b));
        Ok(names)
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.reader()?;
        let mut file = archive
            .by_name(name)
            .map_err(|err| anyhow!("{name} in {:?}: {}", self.path, err))?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes).with_context(|| format!("reading {name}"))?;
        Ok(bytes)
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        self.rewrite(name, Some(data)).map(|_| ())
    }

    fn remove_file(&self, name: &str) -> Result<bool> {
        self.rewrite(name, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_file_entries_in_natural_order() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("demo.cbz");
        create_zip(&archive_path, &["10.jpg", "pages/", "2.png", "ComicInfo.xml"]);

        let archive = ZipArchiver::open(&archive_path).expect("open");
        let names = archive.get_filename_list().expect("list");
        assert_eq!(names, vec!["2.png", "10.jpg", "ComicInfo.xml"]);
    }

    #[test]
    fn write_replaces_and_keeps_other_entries() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("demo.cbz");
        create_zip(&archive_path, &["01.png", "ComicInfo.xml"]);

        let archive = ZipArchiver::open(&archive_path).unwrap();
        archive.write_file("ComicInfo.xml", b"<ComicInfo/>").expect("write");

        assert_eq!(archive.read_file("ComicInfo.xml").unwrap(), b"<ComicInfo/>");
        assert_eq!(archive.read_file("01.png").unwrap(), b"demo");
        assert_eq!(archive.get_filename_list().unwrap().len(), 2);
    }

    #[test]
    fn remove_reports_missing_entries() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("demo.cbz");
        create_zip(&archive_path, &["01.png", "ComicInfo.xml"]);

        let archive = ZipArchiver::open(&archive_path).unwrap();
        assert!(archive.remove_file("ComicInfo.xml").unwrap());
        assert!(!archive.remove_file("ComicInfo.xml").unwrap());
        assert_eq!(archive.get_filename_list().unwrap(), vec!["01.png"]);
    }

    #[test]
    fn open_fails_for_non_zip_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.cbz");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(ZipArchiver::open(&path).is_err());
    }

    fn create_zip(path: &Path, files: &[&str]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);

        for &name in files {
            if name.ends_with('/') {
                zip.add_directory(name.trim_end_matches('/'), options).unwrap();
            } else {
                zip.start_file(name, options).unwrap();
                zip.write_all(b"demo").unwrap();
            }
        }

        zip.finish().unwrap();
    }
}
