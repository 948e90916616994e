//! Resolution of references found on a page

use crate::url::CrawlUri;
use crate::{UrlError, UrlResult};
use url::{ParseError, Url};

/// Schemes that never lead to a fetchable resource
const SKIPPED_SCHEMES: &[&str] = &["javascript", "mailto", "tel", "data"];

/// What a reference found on a page resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A same-origin relative reference; the only kind the crawl follows
    Crawlable(CrawlUri),

    /// A reference that carries its own scheme, or resolves to another origin
    External(String),

    /// Nothing to follow: empty, fragment-only, non-navigational scheme or unparseable
    Skipped,
}

/// Resolves a possibly-relative reference against an absolute base URI
///
/// Follows RFC 3986 resolution: scheme-relative (`//host/x`), absolute-path
/// (`/x`), path-relative (`x`, `../x`) and query-only (`?q`) forms resolve
/// against `base`; absolute references come through unchanged apart from
/// normalization.
///
/// # Examples
///
/// ```
/// use site_mirror::url::{resolve, CrawlUri};
///
/// let base = CrawlUri::parse("https://site.test/catalogue/page-1.html").unwrap();
/// assert_eq!(
///     resolve(&base, "../img/logo.png").unwrap().as_str(),
///     "https://site.test/img/logo.png"
/// );
/// ```
pub fn resolve(base: &CrawlUri, reference: &str) -> UrlResult<CrawlUri> {
    let joined = base
        .as_url()
        .join(reference.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    CrawlUri::from_url(joined)
}

/// Resolves a reference and decides whether the crawl may follow it
///
/// A reference is crawlable only when it has no scheme of its own and its
/// resolved form has the same origin as `base`. Absolute references, including
/// absolute references back to the same site, are reported as
/// [`Resolution::External`].
pub fn resolve_reference(base: &CrawlUri, href: &str) -> Resolution {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Resolution::Skipped;
    }

    match Url::parse(href) {
        Ok(absolute) => {
            if SKIPPED_SCHEMES.contains(&absolute.scheme()) {
                Resolution::Skipped
            } else {
                Resolution::External(href.to_string())
            }
        }
        Err(ParseError::RelativeUrlWithoutBase) => match resolve(base, href) {
            Ok(uri) if base.same_origin(uri.as_url()) => Resolution::Crawlable(uri),
            Ok(uri) => Resolution::External(uri.to_string()),
            Err(e) => {
                tracing::debug!("Failed to resolve {} against {}: {}", href, base, e);
                Resolution::Skipped
            }
        },
        Err(e) => {
            tracing::debug!("Skipping unparseable reference {}: {}", href, e);
            Resolution::Skipped
        }
    }
}
