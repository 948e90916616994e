//! URL handling module for Site-Mirror
//!
//! This module provides URL normalization, the [`CrawlUri`] identity type used as
//! the dedup key everywhere, and resolution of page references against the page
//! they were found on.

mod normalize;
mod resolve;

use crate::UrlResult;
use std::fmt;
use std::str::FromStr;
use url::Url;

// Re-export main functions
pub use normalize::{normalize_parsed, normalize_url};
pub use resolve::{resolve, resolve_reference, Resolution};

/// An absolute, normalized http(s) URL
///
/// Construction always goes through [`normalize_url`], so two spellings of the same
/// resource compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrawlUri(Url);

impl CrawlUri {
    /// Parses and normalizes an absolute URL string
    ///
    /// # Examples
    ///
    /// ```
    /// use site_mirror::url::CrawlUri;
    ///
    /// let a = CrawlUri::parse("https://Site.test:443/a//b#top").unwrap();
    /// let b = CrawlUri::parse("https://site.test/a/b").unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn parse(url_str: &str) -> UrlResult<Self> {
        normalize_url(url_str).map(Self)
    }

    /// Normalizes an already-parsed URL
    pub fn from_url(url: Url) -> UrlResult<Self> {
        normalize_parsed(url).map(Self)
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The path component, always starting with `/`
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Returns true if `other` has the same scheme, host and port
    pub fn same_origin(&self, other: &Url) -> bool {
        self.0.origin() == other.origin()
    }
}

impl fmt::Display for CrawlUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl FromStr for CrawlUri {
    type Err = crate::UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for CrawlUri {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
