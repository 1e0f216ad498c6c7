//! Shared data structures exchanged between metadata providers and archive collaborators.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role spellings understood as "writer".
pub const WRITER_SYNONYMS: &[&str] = &["writer", "plotter", "scripter", "script"];
/// Role spellings understood as "penciller".
pub const PENCILLER_SYNONYMS: &[&str] =
    &["artist", "penciller", "penciler", "breakdowns", "pencils", "painting"];
/// Role spellings understood as "inker".
pub const INKER_SYNONYMS: &[&str] = &["inker", "artist", "finishes", "inks", "painting"];
/// Role spellings understood as "colorist".
pub const COLORIST_SYNONYMS: &[&str] =
    &["colorist", "colourist", "colorer", "colourer", "colors", "painting"];
pub const LETTERER_SYNONYMS: &[&str] = &["letterer", "letters"];
pub const COVER_SYNONYMS: &[&str] = &["cover", "covers", "coverartist", "cover artist"];
pub const EDITOR_SYNONYMS: &[&str] = &["editor", "edits", "editing"];
pub const TRANSLATOR_SYNONYMS: &[&str] = &["translator", "translation"];

/// Kind of container a comic is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveKind {
    Folder,
    Zip,
    Rar,
    SevenZip,
    Tar,
    Unknown,
}

/// A single person credited on the book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credit {
    pub person: String,
    pub role: String,
}

impl Credit {
    pub fn new(person: impl Into<String>, role: impl Into<String>) -> Self {
        Self { person: person.into(), role: role.into() }
    }
}

/// Per-page information. Every optional field is written only when present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub image_index: i32,
    pub bookmark: Option<String>,
    pub double_page: Option<bool>,
    pub height: Option<String>,
    pub size: Option<String>,
    pub width: Option<String>,
    /// FrontCover, Story, Advertisement, ... kept verbatim.
    pub page_type: Option<String>,
}

impl ImageMetadata {
    pub fn new(image_index: i32) -> Self {
        Self { image_index, ..Default::default() }
    }
}

/// Format-independent comic metadata record.
///
/// Providers populate it when reading and consume it when writing. A freshly constructed
/// record reports [`GenericMetadata::is_empty`] as `true`; decoders clear the flag once they
/// have actually visited a document, even if every field turns out to be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericMetadata {
    pub is_empty: bool,

    pub series: Option<String>,
    pub issue: Option<String>,
    pub issue_count: Option<i32>,
    pub title: Option<String>,
    pub volume: Option<i32>,
    pub genres: BTreeSet<String>,
    pub description: Option<String>,
    pub notes: Option<String>,

    pub alternate_series: Option<String>,
    pub alternate_number: Option<String>,
    pub alternate_count: Option<i32>,
    pub story_arcs: Vec<String>,
    pub series_groups: Vec<String>,

    pub publisher: Option<String>,
    pub imprint: Option<String>,
    pub day: Option<i32>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub language: Option<String>,
    pub web_link: Option<String>,
    pub format: Option<String>,
    pub manga: Option<String>,
    pub black_and_white: Option<bool>,
    pub maturity_rating: Option<String>,
    pub critical_rating: Option<f64>,
    pub scan_info: Option<String>,

    pub tags: BTreeSet<String>,
    pub page_count: Option<i32>,

    pub characters: BTreeSet<String>,
    pub teams: BTreeSet<String>,
    pub locations: BTreeSet<String>,

    pub credits: Vec<Credit>,
    pub pages: Vec<ImageMetadata>,
}

impl Default for GenericMetadata {
    fn default() -> Self {
        Self {
            is_empty: true,
            series: None,
            issue: None,
            issue_count: None,
            title: None,
            volume: None,
            genres: BTreeSet::new(),
            description: None,
            notes: None,
            alternate_series: None,
            alternate_number: None,
            alternate_count: None,
            story_arcs: Vec::new(),
            series_groups: Vec::new(),
            publisher: None,
            imprint: None,
            day: None,
            month: None,
            year: None,
            language: None,
            web_link: None,
            format: None,
            manga: None,
            black_and_white: None,
            maturity_rating: None,
            critical_rating: None,
            scan_info: None,
            tags: BTreeSet::new(),
            page_count: None,
            characters: BTreeSet::new(),
            teams: BTreeSet::new(),
            locations: BTreeSet::new(),
            credits: Vec::new(),
            pages: Vec::new(),
        }
    }
}

impl GenericMetadata {
    /// Record a credit unless the same person already holds the same role.
    ///
    /// Both comparisons ignore case, so `("Alice", "writer")` and `("alice", "Writer")` collapse
    /// into the first entry seen.
    pub fn add_credit(&mut self, person: impl Into<String>, role: impl Into<String>) {
        let credit = Credit::new(person, role);
        let exists = self.credits.iter().any(|existing| {
            existing.person.to_lowercase() == credit.person.to_lowercase()
                && existing.role.to_lowercase() == credit.role.to_lowercase()
        });
        if !exists {
            self.credits.push(credit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_empty() {
        let md = GenericMetadata::default();
        assert!(md.is_empty);
        assert!(md.credits.is_empty());
        assert!(md.series.is_none());
    }

    #[test]
    fn add_credit_ignores_case_insensitive_duplicates() {
        let mut md = GenericMetadata::default();
        md.add_credit("Alice", "Writer");
        md.add_credit("alice", "writer");
        md.add_credit("Alice", "Inker");
        assert_eq!(md.credits, vec![Credit::new("Alice", "Writer"), Credit::new("Alice", "Inker")]);
    }

    #[test]
    fn page_constructor_leaves_optional_fields_unset() {
        let page = ImageMetadata::new(4);
        assert_eq!(page.image_index, 4);
        assert!(page.bookmark.is_none());
        assert!(page.double_page.is_none());
        assert!(page.page_type.is_none());
    }
}
