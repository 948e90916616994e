//! Resource extraction from parsed pages
//!
//! # Extraction Rules
//!
//! | Element | Attribute | Kind |
//! |---------|-----------|------|
//! | `<a>` | `href` | [`LinkKind::Page`] |
//! | `<link>` | `href` | [`LinkKind::StylesheetOrScript`] |
//! | `<script>` | `src` | [`LinkKind::StylesheetOrScript`] |
//! | `<img>` | `src` | [`LinkKind::Image`] |
//!
//! Missing or blank attributes are skipped. References are returned raw;
//! resolution and eligibility belong to [`crate::url::resolve_reference`].

use crate::crawler::parser::Document;
use std::collections::HashSet;

/// Classification of a discovered reference, used to route it to a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Anchor target, expected to be HTML
    Page,
    /// Stylesheet, icon or script reference
    StylesheetOrScript,
    /// Image source; downloaded but never crawled for links
    Image,
}

impl LinkKind {
    /// Returns true if links of this kind go through the Frontier
    pub fn is_crawlable(&self) -> bool {
        !matches!(self, Self::Image)
    }
}

/// A reference found in a document, with its classification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedLink {
    /// The attribute value as written in the document (trimmed)
    pub href: String,
    pub kind: LinkKind,
}

const RULES: &[(&str, &str, LinkKind)] = &[
    ("a", "href", LinkKind::Page),
    ("link", "href", LinkKind::StylesheetOrScript),
    ("script", "src", LinkKind::StylesheetOrScript),
    ("img", "src", LinkKind::Image),
];

/// Extracts every classified reference from a document
///
/// The result is deterministic for a given document: rules are applied in the
/// order of the table above, elements in document order, and repeated
/// `(href, kind)` pairs are kept once.
///
/// # Example
///
/// ```
/// use site_mirror::crawler::{extract_resources, Document, LinkKind};
///
/// let doc = Document::parse(r#"<a href="/a">A</a><img src="img/logo.png">"#);
/// let links = extract_resources(&doc);
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[1].kind, LinkKind::Image);
/// ```
pub fn extract_resources(document: &Document) -> Vec<ExtractedLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for &(tag, attribute, kind) in RULES {
        for node in document.select_by_tag(tag) {
            let Some(value) = node.attribute(attribute) else {
                continue;
            };
            let href = value.trim();
            if href.is_empty() {
                continue;
            }

            let link = ExtractedLink {
                href: href.to_string(),
                kind,
            };
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

/// Parses a response body and extracts its references in one synchronous step
pub fn extract_from_body(body: &[u8]) -> Vec<ExtractedLink> {
    let document = Document::from_bytes(body);
    extract_resources(&document)
}
