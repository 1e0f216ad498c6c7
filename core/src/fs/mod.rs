//! Archive collaborators: containers that can hold named metadata entries.

pub mod archive;
pub mod folder;
mod util;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail};

use crate::types::ArchiveKind;

pub use archive::ZipArchiver;
pub use folder::FolderArchiver;
pub use util::{natural_cmp, sanitize_entry_name};

/// Shared result type for fs operations.
pub type Result<T> = crate::Result<T>;

/// Named-file access to a comic container.
pub trait Archiver {
    /// Identifier used in diagnostics, usually the container path.
    fn name(&self) -> String;

    /// Whether arbitrary named files can be stored in this container.
    fn supports_files(&self) -> bool;

    /// Names of every file entry, naturally sorted.
    fn get_filename_list(&self) -> Result<Vec<String>>;

    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Store `data` under `name`, replacing any previous entry.
    fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Delete the entry `name`. Returns `false` when there was nothing to delete.
    fn remove_file(&self, name: &str) -> Result<bool>;
}

/// Container kinds we recognise but cannot write named entries into.
#[derive(Debug, Clone)]
pub struct UnsupportedArchiver {
    path: PathBuf,
    kind: ArchiveKind,
}

impl UnsupportedArchiver {
    pub fn new(path: impl Into<PathBuf>, kind: ArchiveKind) -> Self {
        Self { path: path.into(), kind }
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }
}

impl Archiver for UnsupportedArchiver {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn supports_files(&self) -> bool {
        false
    }

    fn get_filename_list(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        Err(anyhow!("{:?} archive {} cannot read {name}", self.kind, self.path.display()))
    }

    fn write_file(&self, name: &str, _data: &[u8]) -> Result<()> {
        bail!("{:?} archive {} cannot store {name}", self.kind, self.path.display())
    }

    fn remove_file(&self, _name: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Open `path` with the collaborator matching its kind.
pub fn open_archive(path: &Path) -> Result<Box<dyn Archiver>> {
    match detect_kind(path) {
        ArchiveKind::Folder => Ok(Box::new(FolderArchiver::open(path)?)),
        ArchiveKind::Zip => Ok(Box::new(ZipArchiver::open(path)?)),
        kind => Ok(Box::new(UnsupportedArchiver::new(path, kind))),
    }
}

pub fn detect_kind(path: &Path) -> ArchiveKind {
    if path.is_dir() {
        return ArchiveKind::Folder;
    }
    match path.extension().and_then(|ext| ext.to_str()).map(|s| s.to_ascii_lowercase()) {
        Some(ref ext) if ext == "cbz" || ext == "zip" => ArchiveKind::Zip,
        Some(ref ext) if ext == "cbr" || ext == "rar" => ArchiveKind::Rar,
        Some(ref ext) if ext == "cb7" || ext == "7z" => ArchiveKind::SevenZip,
        Some(ref ext) if ext == "cbt" || ext == "tar" => ArchiveKind::Tar,
        _ => ArchiveKind::Unknown,
    }
}
