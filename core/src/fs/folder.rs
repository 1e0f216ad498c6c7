//! Unpacked comic directories.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Error, anyhow};
use tempfile::NamedTempFile;

use super::{Archiver, Result, util};

/// A directory of page images treated as a container of named files.
#[derive(Debug, Clone)]
pub struct FolderArchiver {
    root: PathBuf,
}

impl FolderArchiver {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.exists() {
            return Err(anyhow!("folder {:?} does not exist", root));
        }
        if !root.is_dir() {
            return Err(anyhow!("folder {:?} is not a directory", root));
        }
        Ok(Self { root: root.to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        util::sanitize_entry_name(name)
            .map(|rel| self.root.join(rel))
            .ok_or_else(|| anyhow!("entry name {name:?} escapes {:?}", self.root))
    }
}

impl Archiver for FolderArchiver {
    fn name(&self) -> String {
        self.root.display().to_string()
    }

    fn supports_files(&self) -> bool {
        true
    }

    fn get_filename_list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir).with_context(|| format!("reading {:?}", dir))? {
                let entry = entry?;
                let path = entry.path();
                if util::is_hidden(&path) {
                    continue;
                }
                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    let rel = path.strip_prefix(&self.root).unwrap_or(path.as_path());
                    let parts: Vec<_> =
                        rel.components().map(|part| part.as_os_str().to_string_lossy()).collect();
                    names.push(parts.join("/"));
                }
            }
        }

        names.sort_by(|a, b| util::natural_cmp(a, b));
        Ok(names)
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        fs::read(&path).with_context(|| format!("reading {}", path.display()))
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(name)?;
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("entry path {} has no parent directory", path.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;

        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("allocating temp file in {}", parent.display()))?;
        tmp.write_all(data).with_context(|| format!("writing {}", path.display()))?;
        tmp.flush().with_context(|| format!("flushing {}", path.display()))?;
        tmp.persist(&path).map_err(|err| Error::from(err.error))?;
        Ok(())
    }

    fn remove_file(&self, name: &str) -> Result<bool> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
