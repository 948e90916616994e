//! Output module: the mirrored file tree and the crawl report
//!
//! This module handles:
//! - Mapping URIs onto local paths and writing content
//! - Counting saved and failed pages and images
//! - Printing the end-of-crawl report

mod persister;
mod report;

pub use persister::{PathParts, Persister};
pub use report::{print_report, CrawlCounters, CrawlReport};
