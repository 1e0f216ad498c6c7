//! ComicInfo.xml support: decoding, merge-preserving encoding, and archive integration.
//!
//! The document is handled as an [`xmltree::Element`] tree. Decoding reads the recognised
//! elements into a [`GenericMetadata`]; encoding writes them back onto either a fresh tree or
//! the tree parsed from the entry already stored in the archive, so elements written by other
//! tools survive an update untouched.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use xml::name::OwnedName;
use xml::namespace::Namespace;
use xml::reader::{ParserConfig, XmlEvent};
use xml::writer::EmitterConfig;
use xmltree::{Element, ParseError, XMLNode};

use crate::error::MetadataError;
use crate::fs::Archiver;
use crate::types::{GenericMetadata, ImageMetadata};

use super::credits::{self, CreditCategory, CreditLists};
use super::xlate::{is_truthy, split, xlate, xlate_bool, xlate_float, xlate_int};
use super::{MetadataProvider, Result};

/// Archive entry holding the document.
pub const COMIC_INFO_FILENAME: &str = "ComicInfo.xml";
/// Root element of every ComicInfo document.
pub const ROOT_TAG: &str = "ComicInfo";

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
const PAGES_TAG: &str = "Pages";
const PAGE_TAG: &str = "Page";

/// Model attributes this format can store.
pub const SUPPORTED_ATTRIBUTES: &[&str] = &[
    "series",
    "issue",
    "issue_count",
    "title",
    "volume",
    "genres",
    "description",
    "notes",
    "alternate_series",
    "alternate_number",
    "alternate_count",
    "story_arcs",
    "series_groups",
    "publisher",
    "imprint",
    "day",
    "month",
    "year",
    "language",
    "web_link",
    "format",
    "manga",
    "black_and_white",
    "maturity_rating",
    "critical_rating",
    "scan_info",
    "tags",
    "pages",
    "pages.bookmark",
    "pages.double_page",
    "pages.height",
    "pages.image_index",
    "pages.size",
    "pages.type",
    "pages.width",
    "page_count",
    "characters",
    "teams",
    "locations",
    "credits",
    "credits.person",
    "credits.role",
];

/// Cheap shape check: well-formed XML with a `<ComicInfo>` root.
pub fn validate(bytes: &[u8]) -> bool {
    parse_root(bytes).is_ok()
}

/// Decode a ComicInfo document into a fresh metadata record.
pub fn decode(bytes: &[u8]) -> Result<GenericMetadata> {
    let root = parse_root(bytes)?;
    let md = metadata_from_element(&root);
    debug!(
        target: "meta::comicinfo",
        "decoded ComicInfo: {} credits, {} pages",
        md.credits.len(),
        md.pages.len()
    );
    Ok(md)
}

/// Encode `md` as a ComicInfo document.
///
/// With `existing` bytes the update is applied on top of that document: recognised elements
/// are rewritten or removed, everything else is kept as-is. The bytes must themselves be a
/// valid ComicInfo document; no fallback to a fresh document is attempted.
pub fn encode(md: &GenericMetadata, existing: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut root = match existing.filter(|bytes| !bytes.is_empty()) {
        Some(bytes) => parse_root(bytes)?,
        None => new_document(),
    };
    apply_metadata(&mut root, md);
    write_document(&root)
}

/// Whether credits with this role are written by [`encode`].
pub fn supports_role(role: &str) -> bool {
    credits::supports_role(role)
}

/// Re-serialise a stored document with normalised indentation.
pub fn to_pretty_string(bytes: &[u8]) -> Result<String> {
    let root = parse_root(bytes)?;
    let out = write_document(&root)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn parse_root(bytes: &[u8]) -> Result<Element> {
    let root = parse_tree(bytes)?;
    if let Some(uri) = root.namespace.as_deref().filter(|uri| !uri.is_empty()) {
        return Err(MetadataError::NotComicInfo { root: format!("{{{uri}}}{}", root.name) });
    }
    if root.name != ROOT_TAG {
        return Err(MetadataError::NotComicInfo { root: root.name });
    }
    Ok(root)
}

/// Build the element tree from parser events.
///
/// Attribute keys keep their prefix (`xsi:nil`), so namespaced attributes written by other
/// tools are emitted again exactly as they were read.
fn parse_tree(bytes: &[u8]) -> Result<Element> {
    let reader = ParserConfig::new().ignore_comments(false).create_reader(bytes);
    let mut open: Vec<Element> = Vec::new();
    let mut root = None;

    for event in reader {
        let node = match event.map_err(ParseError::MalformedXml)? {
            XmlEvent::StartElement { name, attributes, namespace } => {
                let mut element = Element::new(&name.local_name);
                element.prefix = name.prefix;
                element.namespace = name.namespace;
                element.namespaces = (!namespace.is_essentially_empty()).then_some(namespace);
                for attribute in attributes {
                    element.attributes.insert(qualified_name(attribute.name), attribute.value);
                }
                open.push(element);
                continue;
            }
            XmlEvent::EndElement { .. } => match open.pop() {
                Some(element) if open.is_empty() => {
                    root = Some(element);
                    continue;
                }
                Some(element) => XMLNode::Element(element),
                None => continue,
            },
            XmlEvent::Characters(text) => XMLNode::Text(text),
            XmlEvent::CData(text) => XMLNode::CData(text),
            XmlEvent::Comment(text) => XMLNode::Comment(text),
            XmlEvent::ProcessingInstruction { name, data } => {
                XMLNode::ProcessingInstruction(name, data)
            }
            _ => continue,
        };
        // Nodes outside the root element are dropped.
        if let Some(parent) = open.last_mut() {
            parent.children.push(node);
        }
    }

    root.ok_or_else(|| ParseError::CannotParse.into())
}

fn qualified_name(name: OwnedName) -> String {
    match name.prefix {
        Some(prefix) => format!("{prefix}:{}", name.local_name),
        None => name.local_name,
    }
}

fn new_document() -> Element {
    let mut root = Element::new(ROOT_TAG);
    let mut namespaces = Namespace::empty();
    namespaces.put("xsi", XSI_NAMESPACE);
    namespaces.put("xsd", XSD_NAMESPACE);
    root.namespaces = Some(namespaces);
    root
}

fn write_document(root: &Element) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let config = EmitterConfig::new().perform_indent(true).write_document_declaration(true);
    root.write_with_config(&mut out, config)?;
    Ok(out)
}

fn metadata_from_element(root: &Element) -> GenericMetadata {
    let get = |tag: &str| root.child_text(tag);

    let mut md = GenericMetadata::default();

    md.series = xlate(get("Series").as_deref());
    md.issue = xlate(get("Number").as_deref());
    md.issue_count = xlate_int(get("Count").as_deref());
    md.title = xlate(get("Title").as_deref());
    md.volume = xlate_int(get("Volume").as_deref());
    md.genres = split(get("Genre").as_deref(), ',').into_iter().collect();
    md.description = xlate(get("Summary").as_deref());
    md.notes = xlate(get("Notes").as_deref());

    md.alternate_series = xlate(get("AlternateSeries").as_deref());
    md.alternate_number = xlate(get("AlternateNumber").as_deref());
    md.alternate_count = xlate_int(get("AlternateCount").as_deref());
    md.story_arcs = split(get("StoryArc").as_deref(), ',');
    md.series_groups = split(get("SeriesGroup").as_deref(), ',');

    md.publisher = xlate(get("Publisher").as_deref());
    md.imprint = xlate(get("Imprint").as_deref());
    md.day = xlate_int(get("Day").as_deref());
    md.month = xlate_int(get("Month").as_deref());
    md.year = xlate_int(get("Year").as_deref());
    md.language = xlate(get("LanguageISO").as_deref());
    md.web_link = xlate(get("Web").as_deref());
    md.format = xlate(get("Format").as_deref());
    md.manga = xlate(get("Manga").as_deref());
    md.black_and_white = xlate_bool(get("BlackAndWhite").as_deref());
    md.maturity_rating = xlate(get("AgeRating").as_deref());
    md.critical_rating = xlate_float(get("CommunityRating").as_deref());
    md.scan_info = xlate(get("ScanInformation").as_deref());

    md.tags = split(get("Tags").as_deref(), ',').into_iter().collect();
    md.page_count = xlate_int(get("PageCount").as_deref());

    md.characters = split(get("Characters").as_deref(), ',').into_iter().collect();
    md.teams = split(get("Teams").as_deref(), ',').into_iter().collect();
    md.locations = split(get("Locations").as_deref(), ',').into_iter().collect();

    // Every occurrence counts, not only the first.
    for element in root.children.iter().filter_map(XMLNode::as_element) {
        let Some(category) = CreditCategory::from_tag(&element.name) else {
            continue;
        };
        let text = element.get_text();
        for person in split(text.as_deref(), ',') {
            md.add_credit(person, category.label());
        }
    }

    if let Some(pages) = root.get_child(PAGES_TAG) {
        md.pages = pages
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .filter(|element| element.name == PAGE_TAG)
            .enumerate()
            .map(|(position, element)| page_from_element(position, element))
            .collect();
    }

    md.is_empty = false;
    md
}

fn page_from_element(position: usize, element: &Element) -> ImageMetadata {
    let attr = |name: &str| element.attributes.get(name).cloned();

    let image_index = match attr("Image") {
        Some(raw) => raw.trim().parse::<i32>().unwrap_or_else(|_| {
            warn!(
                target: "meta::comicinfo",
                "page {position} has a non-numeric Image attribute {raw:?}; using its position"
            );
            position as i32
        }),
        None => position as i32,
    };

    ImageMetadata {
        image_index,
        bookmark: attr("Bookmark"),
        double_page: attr("DoublePage").map(|value| is_truthy(&value)),
        height: attr("ImageHeight"),
        size: attr("ImageSize"),
        width: attr("ImageWidth"),
        page_type: attr("Type"),
    }
}

fn apply_metadata(root: &mut Element, md: &GenericMetadata) {
    let mut credit_lists = CreditLists::default();
    for credit in &md.credits {
        credit_lists.push(&credit.person, &credit.role);
    }

    root.assign("Series", md.series.clone());
    root.assign("Number", md.issue.clone());
    root.assign("Count", number(md.issue_count));
    root.assign("Title", md.title.clone());
    root.assign("Volume", number(md.volume));
    root.assign("Genre", join(&md.genres));
    root.assign("Summary", md.description.clone());
    root.assign("Notes", md.notes.clone());

    root.assign("AlternateSeries", md.alternate_series.clone());
    root.assign("AlternateNumber", md.alternate_number.clone());
    root.assign("AlternateCount", number(md.alternate_count));
    root.assign("StoryArc", join(&md.story_arcs));
    root.assign("SeriesGroup", join(&md.series_groups));

    root.assign("Publisher", md.publisher.clone());
    root.assign("Imprint", md.imprint.clone());
    root.assign("Day", number(md.day));
    root.assign("Month", number(md.month));
    root.assign("Year", number(md.year));
    root.assign("LanguageISO", md.language.clone());
    root.assign("Web", md.web_link.clone());
    root.assign("Format", md.format.clone());
    root.assign("Manga", md.manga.clone());
    // There is no "No": a false or unknown value removes the element.
    root.assign("BlackAndWhite", (md.black_and_white == Some(true)).then(|| "Yes".to_string()));
    root.assign("AgeRating", md.maturity_rating.clone());
    root.assign("CommunityRating", number(md.critical_rating));
    root.assign("ScanInformation", md.scan_info.clone());

    root.assign("Tags", join(&md.tags));
    root.assign("PageCount", number(md.page_count));

    root.assign("Characters", join(&md.characters));
    root.assign("Teams", join(&md.teams));
    root.assign("Locations", join(&md.locations));

    for category in CreditCategory::ALL {
        root.assign(category.tag(), join(credit_lists.names(category)));
    }

    let pages = pages_element(&md.pages);
    match root.children.iter_mut().find_map(|node| match node {
        XMLNode::Element(element) if element.name == PAGES_TAG => Some(element),
        _ => None,
    }) {
        Some(existing) => *existing = pages,
        None => root.children.push(XMLNode::Element(pages)),
    }
}

fn pages_element(pages: &[ImageMetadata]) -> Element {
    let mut container = Element::new(PAGES_TAG);
    for page in pages {
        let mut attributes: BTreeMap<&str, String> = BTreeMap::new();
        attributes.insert("Image", page.image_index.to_string());
        let optional = [
            ("Bookmark", page.bookmark.clone()),
            ("DoublePage", page.double_page.map(bool_attribute)),
            ("ImageHeight", page.height.clone()),
            ("ImageSize", page.size.clone()),
            ("ImageWidth", page.width.clone()),
            ("Type", page.page_type.clone()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                attributes.insert(name, value);
            }
        }

        let mut element = Element::new(PAGE_TAG);
        for (name, value) in attributes {
            element.attributes.insert(name.to_string(), value);
        }
        container.children.push(XMLNode::Element(element));
    }
    container
}

fn bool_attribute(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn number<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|value| value.to_string())
}

fn join<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let joined = values.into_iter().map(String::as_str).collect::<Vec<_>>().join(",");
    if joined.is_empty() { None } else { Some(joined) }
}

/// Tree helpers shared by the decode and encode paths.
trait ElementExt {
    /// Text of the first child element named `tag`.
    fn child_text(&self, tag: &str) -> Option<String>;

    /// Set the text of the child element `tag`, creating it at the end when missing.
    ///
    /// `None` or an empty string removes every `tag` child instead. When set, only one `tag`
    /// child remains afterwards.
    fn assign(&mut self, tag: &str, value: Option<String>);
}

impl ElementExt for Element {
    fn child_text(&self, tag: &str) -> Option<String> {
        self.get_child(tag).and_then(|element| element.get_text()).map(|text| text.into_owned())
    }

    fn assign(&mut self, tag: &str, value: Option<String>) {
        let Some(text) = value.filter(|text| !text.is_empty()) else {
            self.children.retain(|node| !is_element_named(node, tag));
            return;
        };

        let mut updated = false;
        self.children.retain_mut(|node| match node {
            XMLNode::Element(element) if element.name == tag => {
                if updated {
                    return false;
                }
                element.children = vec![XMLNode::Text(text.clone())];
                updated = true;
                true
            }
            _ => true,
        });

        if !updated {
            let mut element = Element::new(tag);
            element.children.push(XMLNode::Text(text));
            self.children.push(XMLNode::Element(element));
        }
    }
}

fn is_element_named(node: &XMLNode, tag: &str) -> bool {
    matches!(node, XMLNode::Element(element) if element.name == tag)
}

/// The ComicInfo.xml provider.
#[derive(Debug, Clone)]
pub struct ComicInfoXml {
    filename: String,
}

impl Default for ComicInfoXml {
    fn default() -> Self {
        Self { filename: COMIC_INFO_FILENAME.to_string() }
    }
}

impl ComicInfoXml {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different archive entry name than `ComicInfo.xml`.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Bytes of the stored entry, provided it exists and passes [`validate`].
    fn read_valid(&self, archive: &dyn Archiver) -> crate::Result<Option<Vec<u8>>> {
        if !self.supports_metadata(archive) {
            return Ok(None);
        }
        if !archive.get_filename_list()?.iter().any(|name| name == &self.filename) {
            return Ok(None);
        }
        let bytes = archive.read_file(&self.filename)?;
        if validate(&bytes) {
            Ok(Some(bytes))
        } else {
            debug!(
                target: "meta::comicinfo",
                "{} in {} is not a ComicInfo document",
                self.filename,
                archive.name()
            );
            Ok(None)
        }
    }
}

impl MetadataProvider for ComicInfoXml {
    fn name(&self) -> &'static str {
        "Comic Info XML"
    }

    fn short_name(&self) -> &'static str {
        "cix"
    }

    fn supported_attributes(&self) -> &'static [&'static str] {
        SUPPORTED_ATTRIBUTES
    }

    fn supports_credit_role(&self, role: &str) -> bool {
        supports_role(role)
    }

    fn supports_metadata(&self, archive: &dyn Archiver) -> bool {
        archive.supports_files()
    }

    fn has_metadata(&self, archive: &dyn Archiver) -> crate::Result<bool> {
        Ok(self.read_valid(archive)?.is_some())
    }

    fn get_metadata(&self, archive: &dyn Archiver) -> crate::Result<GenericMetadata> {
        match self.read_valid(archive)? {
            Some(bytes) => Ok(decode(&bytes)?),
            None => Ok(GenericMetadata::default()),
        }
    }

    fn get_metadata_string(&self, archive: &dyn Archiver) -> crate::Result<String> {
        match self.read_valid(archive)? {
            Some(bytes) => Ok(to_pretty_string(&bytes)?),
            None => Ok(String::new()),
        }
    }

    fn set_metadata(&self, md: &GenericMetadata, archive: &dyn Archiver) -> crate::Result<bool> {
        if !self.supports_metadata(archive) {
            warn!(
                target: "meta::comicinfo",
                "archive ({}) does not support {} metadata",
                archive.name(),
                self.name()
            );
            return Ok(false);
        }

        let existing = self.read_valid(archive)?;
        let bytes = encode(md, existing.as_deref())?;
        archive.write_file(&self.filename, &bytes)?;
        debug!(
            target: "meta::comicinfo",
            "wrote {} ({} bytes) to {}",
            self.filename,
            bytes.len(),
            archive.name()
        );
        Ok(true)
    }

    fn remove_metadata(&self, archive: &dyn Archiver) -> crate::Result<bool> {
        if self.read_valid(archive)?.is_none() {
            return Ok(false);
        }
        archive.remove_file(&self.filename)
    }
}
