//! ComicInfo.xml metadata support for comic archives.
//!
//! [`meta::comicinfo`] maps between [`GenericMetadata`] and the ComicInfo XML document,
//! [`fs`] provides the archive collaborators it reads from and writes to.

#![deny(missing_debug_implementations)]

pub mod error;
pub mod fs;
pub mod log;
pub mod meta;
pub mod types;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub use error::MetadataError;
pub use fs::{Archiver, open_archive};
pub use meta::{ComicInfoXml, MetadataProvider};
pub use types::{ArchiveKind, Credit, GenericMetadata, ImageMetadata};

/// Returns the version of the core crate for telemetry and debugging.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
