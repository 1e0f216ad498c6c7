//! Error kinds surfaced by the metadata mapping layer.

use thiserror::Error;

/// Failure while reading or producing a metadata document.
///
/// Field-level problems (a non-numeric `<Count>`, say) are never reported here: the field is
/// simply left unset. Only document-level problems are errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The bytes are not well-formed XML.
    #[error("malformed XML: {0}")]
    Malformed(#[from] xmltree::ParseError),

    /// Well-formed XML whose root element belongs to some other format.
    #[error("not a ComicInfo document (root element is <{root}>)")]
    NotComicInfo { root: String },

    #[error("failed to serialise XML: {0}")]
    Write(#[from] xml::writer::Error),
}
