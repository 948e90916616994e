//! HTML document parsing
//!
//! A thin layer over `scraper` exposing the two queries the crawl needs:
//! select all elements with a given tag, and read an attribute from one.
//!
//! `scraper::Html` is not `Send`; a [`Document`] must be built, queried and
//! dropped without crossing an `.await`.

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document
pub struct Document {
    html: Html,
}

/// One element of a [`Document`]
#[derive(Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl Document {
    /// Parses HTML text
    ///
    /// Parsing never fails: malformed markup is repaired the way browsers do.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Parses a response body, replacing invalid UTF-8 sequences
    pub fn from_bytes(body: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(body))
    }

    /// Returns every element with the given tag name, in document order
    ///
    /// An invalid tag name yields no elements.
    pub fn select_by_tag(&self, tag: &str) -> Vec<Node<'_>> {
        match Selector::parse(tag) {
            Ok(selector) => self
                .html
                .select(&selector)
                .map(|element| Node { element })
                .collect(),
            Err(_) => {
                tracing::debug!("Ignoring invalid tag selector {:?}", tag);
                Vec::new()
            }
        }
    }
}

impl<'a> Node<'a> {
    /// Returns the value of an attribute, if present
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }
}
