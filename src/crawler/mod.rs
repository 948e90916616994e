//! Crawler module for fetching and mirroring a single site
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`Fetch`] trait
//! - HTML parsing and resource extraction
//! - The Frontier with its in-flight and visited sets
//! - Page and image pipelines
//! - Bounded-concurrency scheduling and progress reporting
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod parser;
mod pipeline;
mod progress;
mod scheduler;

#[cfg(test)]
mod testing;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{extract_from_body, extract_resources, ExtractedLink, LinkKind};
pub use fetcher::{build_http_client, Fetch, FetchResult, HttpFetcher};
pub use frontier::{Frontier, FrontierSnapshot};
pub use parser::{Document, Node};
pub use pipeline::{ImageBatch, ImageOutcome, ImagePipeline, PageOutcome, PagePipeline};
pub use progress::{completion_fraction, milestone_message, LogProgress, ProgressObserver};
pub use scheduler::{ScheduleSummary, Scheduler, SchedulerPhase};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::Result;
use std::future::Future;

/// Runs a complete crawl, stopping early if `shutdown` resolves
///
/// This is the main entry point for the binary. It will:
/// 1. Build the HTTP client from the configuration
/// 2. Fetch the seed page, failing fast if it is unreachable
/// 3. Crawl every same-origin page reachable from the seed
/// 4. Download the images those pages reference
/// 5. Return the crawl report
pub async fn crawl<S>(config: Config, shutdown: S) -> Result<CrawlReport>
where
    S: Future<Output = ()>,
{
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run_until(shutdown).await
}
