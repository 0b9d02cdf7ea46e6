//! Parsing of catalog documents.
//!
//! The library listing yields [`Library`] records; an item listing yields a
//! [`Coverage`] count of entries and entries carrying a theme.

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::{debug, warn};

/// Element holding a single media file.
const VIDEO_TAG: &str = "Video";
/// Element holding a library in the listing, or a container-style entry
/// (a show, an artist) in an item listing.
const DIRECTORY_TAG: &str = "Directory";
/// Attribute whose presence marks an entry as themed.
const THEME_ATTR: &str = "theme";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("library entry is missing the '{attribute}' attribute")]
    MissingAttribute { attribute: &'static str },
}

impl From<roxmltree::Error> for ParseError {
    fn from(err: roxmltree::Error) -> Self {
        ParseError::Malformed(err.to_string())
    }
}

/// A library as listed by the server. Only lives for one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub key: String,
    pub title: String,
}

/// Theme coverage of one library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub total: u64,
    pub themed: u64,
}

impl std::fmt::Display for Coverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.themed, self.total)
    }
}

/// Every element strictly below the root element with the given tag name.
fn descendants_named<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    let root = doc.root_element();
    root.descendants()
        .filter(move |n| *n != root && n.is_element() && n.tag_name().name() == tag)
}

/// Parse the library listing.
///
/// Any `Directory` without a `key` or `title` fails the whole listing.
pub fn parse_libraries(document: &str) -> Result<Vec<Library>, ParseError> {
    let doc = Document::parse(document)?;

    descendants_named(&doc, DIRECTORY_TAG)
        .map(|node| {
            let key = node
                .attribute("key")
                .ok_or(ParseError::MissingAttribute { attribute: "key" })?;
            let title = node
                .attribute("title")
                .ok_or(ParseError::MissingAttribute { attribute: "title" })?;
            Ok(Library {
                key: key.to_string(),
                title: title.to_string(),
            })
        })
        .collect()
}

/// Count entries and themed entries in an item listing.
pub fn try_count(document: &str) -> Result<Coverage, ParseError> {
    let doc = Document::parse(document)?;

    let mut coverage = Coverage::default();
    for tag in [VIDEO_TAG, DIRECTORY_TAG] {
        for node in descendants_named(&doc, tag) {
            coverage.total += 1;
            if node.has_attribute(THEME_ATTR) {
                coverage.themed += 1;
            }
        }
    }

    Ok(coverage)
}

/// Best-effort variant of [`try_count`]: a malformed document counts as `0/0`.
pub fn count(document: &str) -> Coverage {
    match try_count(document) {
        Ok(coverage) => {
            debug!("Counted items with themes: {}", coverage);
            coverage
        }
        Err(e) => {
            warn!("Error parsing media items document: {e}");
            Coverage::default()
        }
    }
}
