//! Metadata providers: mapping between archive entries and [`GenericMetadata`].

pub mod comicinfo;
pub mod credits;
mod xlate;

pub use comicinfo::{COMIC_INFO_FILENAME, ComicInfoXml, decode, encode, supports_role, validate};
pub use credits::CreditCategory;

use crate::error::MetadataError;
use crate::fs::Archiver;
use crate::types::GenericMetadata;

/// Result type for document-level mapping operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// A metadata format that can be stored inside an archive.
///
/// Archive I/O failures are propagated; an archive that simply cannot hold the format is a
/// soft failure reported as `Ok(false)`.
pub trait MetadataProvider {
    /// Human readable format name used in diagnostics.
    fn name(&self) -> &'static str;

    fn short_name(&self) -> &'static str;

    /// Model attribute names the format can store.
    fn supported_attributes(&self) -> &'static [&'static str];

    fn supports_credit_role(&self, role: &str) -> bool;

    fn supports_metadata(&self, archive: &dyn Archiver) -> bool;

    /// Whether the archive currently holds a valid document of this format.
    fn has_metadata(&self, archive: &dyn Archiver) -> crate::Result<bool>;

    /// Decoded metadata, or a blank record when the archive holds none.
    fn get_metadata(&self, archive: &dyn Archiver) -> crate::Result<GenericMetadata>;

    /// The stored document as text, or an empty string when absent.
    fn get_metadata_string(&self, archive: &dyn Archiver) -> crate::Result<String>;

    /// Write `md` into the archive, merging with any document already stored.
    fn set_metadata(&self, md: &GenericMetadata, archive: &dyn Archiver) -> crate::Result<bool>;

    fn remove_metadata(&self, archive: &dyn Archiver) -> crate::Result<bool>;
}
