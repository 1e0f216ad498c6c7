//! Mapping between free-text credit roles and the fixed credit tags of ComicInfo.

use crate::types::{
    COLORIST_SYNONYMS, COVER_SYNONYMS, EDITOR_SYNONYMS, INKER_SYNONYMS, LETTERER_SYNONYMS,
    PENCILLER_SYNONYMS, TRANSLATOR_SYNONYMS, WRITER_SYNONYMS,
};

/// One of the credit categories ComicInfo stores natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreditCategory {
    Writer,
    Penciller,
    Inker,
    Colorist,
    Letterer,
    Cover,
    Editor,
    Translator,
}

impl CreditCategory {
    /// Every category, in document order.
    pub const ALL: [CreditCategory; 8] = [
        CreditCategory::Writer,
        CreditCategory::Penciller,
        CreditCategory::Inker,
        CreditCategory::Colorist,
        CreditCategory::Letterer,
        CreditCategory::Cover,
        CreditCategory::Editor,
        CreditCategory::Translator,
    ];

    /// Element name used in the XML document.
    pub fn tag(self) -> &'static str {
        match self {
            CreditCategory::Cover => "CoverArtist",
            other => other.label(),
        }
    }

    /// Role string attached to credits decoded from this category.
    pub fn label(self) -> &'static str {
        match self {
            CreditCategory::Writer => "Writer",
            CreditCategory::Penciller => "Penciller",
            CreditCategory::Inker => "Inker",
            CreditCategory::Colorist => "Colorist",
            CreditCategory::Letterer => "Letterer",
            CreditCategory::Cover => "Cover",
            CreditCategory::Editor => "Editor",
            CreditCategory::Translator => "Translator",
        }
    }

    /// Lowercase role spellings that belong to this category.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            CreditCategory::Writer => WRITER_SYNONYMS,
            CreditCategory::Penciller => PENCILLER_SYNONYMS,
            CreditCategory::Inker => INKER_SYNONYMS,
            CreditCategory::Colorist => COLORIST_SYNONYMS,
            CreditCategory::Letterer => LETTERER_SYNONYMS,
            CreditCategory::Cover => COVER_SYNONYMS,
            CreditCategory::Editor => EDITOR_SYNONYMS,
            CreditCategory::Translator => TRANSLATOR_SYNONYMS,
        }
    }

    /// Category stored under the element `tag`, if any.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.tag() == tag)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Every category whose synonym set contains `role`, compared case-insensitively.
///
/// A role may land in several categories ("artist" is both penciller and inker).
pub fn categories_for(role: &str) -> impl Iterator<Item = CreditCategory> {
    let folded = role.to_lowercase();
    CreditCategory::ALL
        .into_iter()
        .filter(move |category| category.synonyms().contains(&folded.as_str()))
}

/// Whether `role` would be written to at least one credit element.
pub fn supports_role(role: &str) -> bool {
    categories_for(role).next().is_some()
}

/// Person names grouped by category, ready to be joined into credit elements.
#[derive(Debug, Default)]
pub(crate) struct CreditLists {
    names: [Vec<String>; 8],
}

impl CreditLists {
    /// Route `person` into every category matched by `role`. Unrecognised roles are dropped.
    ///
    /// Commas are removed from the name because the element text is comma-delimited.
    pub(crate) fn push(&mut self, person: &str, role: &str) {
        let person = person.replace(',', "");
        for category in categories_for(role) {
            self.names[category.index()].push(person.clone());
        }
    }

    pub(crate) fn names(&self, category: CreditCategory) -> &[String] {
        &self.names[category.index()]
    }
}
