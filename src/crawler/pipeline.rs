//! Page and image pipelines
//!
//! A page goes fetch → extract → resolve → enqueue → persist → download
//! images. Images go fetch → persist and never touch the Frontier.

use crate::crawler::extractor::extract_from_body;
use crate::crawler::fetcher::{Fetch, FetchResult};
use crate::crawler::frontier::Frontier;
use crate::output::{CrawlCounters, Persister};
use crate::url::{resolve_reference, CrawlUri, Resolution};
use crate::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// What happened to a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was fetched, its links handled and its body written
    Saved {
        path: PathBuf,
        links_enqueued: usize,
        images_saved: usize,
        images_failed: usize,
    },

    /// The fetch failed; nothing was extracted or written
    FetchFailed { reason: String },
}

/// What happened to an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Saved { path: PathBuf, bytes: usize },
    FetchFailed { reason: String },
    /// Another page already claimed this image
    AlreadyDownloaded,
}

/// Totals for one page's image fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageBatch {
    pub saved: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Marks the page visited when dropped, whatever path `process` leaves by
struct VisitGuard<'a> {
    frontier: &'a Frontier,
    uri: &'a CrawlUri,
}

impl Drop for VisitGuard<'_> {
    fn drop(&mut self) {
        self.frontier.mark_visited(self.uri);
        tracing::debug!("Visited {}", self.uri);
    }
}

/// Downloads images through a crawl-wide bounded pool
pub struct ImagePipeline<F> {
    fetcher: Arc<F>,
    persister: Arc<Persister>,
    permits: Arc<Semaphore>,
    seen: Option<Arc<Mutex<HashSet<CrawlUri>>>>,
    counters: Arc<CrawlCounters>,
}

impl<F> Clone for ImagePipeline<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            persister: Arc::clone(&self.persister),
            permits: Arc::clone(&self.permits),
            seen: self.seen.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<F: Fetch> ImagePipeline<F> {
    /// Creates an image pipeline
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Number of image downloads allowed in flight across
    ///   the whole crawl
    /// * `dedupe` - Download each image URI at most once per crawl
    pub fn new(
        fetcher: Arc<F>,
        persister: Arc<Persister>,
        counters: Arc<CrawlCounters>,
        max_concurrent: usize,
        dedupe: bool,
    ) -> Self {
        Self {
            fetcher,
            persister,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            seen: dedupe.then(|| Arc::new(Mutex::new(HashSet::new()))),
            counters,
        }
    }

    // Returns false if the image was already claimed
    fn claim(&self, uri: &CrawlUri) -> bool {
        match &self.seen {
            Some(seen) => seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(uri.clone()),
            None => true,
        }
    }

    /// Fetches one image and writes its bytes to the mirrored path
    ///
    /// Fetch failures are logged and reported as [`ImageOutcome::FetchFailed`];
    /// only a filesystem failure is returned as an error.
    pub async fn download(&self, uri: &CrawlUri) -> Result<ImageOutcome> {
        if !self.claim(uri) {
            tracing::trace!("Image {} already downloaded", uri);
            return Ok(ImageOutcome::AlreadyDownloaded);
        }

        let Ok(_permit) = self.permits.acquire().await else {
            self.counters.record_image_failed();
            return Ok(ImageOutcome::FetchFailed {
                reason: "image pool closed".to_string(),
            });
        };

        let body = match self.fetcher.fetch(uri).await {
            FetchResult::Success { body, .. } => body,
            failure => {
                let reason = failure.failure_reason().unwrap_or_default();
                tracing::warn!("Failed to download image {}: {}", uri, reason);
                self.counters.record_image_failed();
                return Ok(ImageOutcome::FetchFailed { reason });
            }
        };

        match self.persister.write(uri, &body).await {
            Ok(path) => {
                self.counters.record_image_saved(body.len());
                Ok(ImageOutcome::Saved {
                    path,
                    bytes: body.len(),
                })
            }
            Err(e) => {
                self.counters.record_image_failed();
                Err(e)
            }
        }
    }

    /// Downloads a page's images concurrently and waits for all of them
    pub async fn download_all(&self, uris: Vec<CrawlUri>) -> ImageBatch {
        let mut tasks = JoinSet::new();
        for uri in uris {
            let pipeline = self.clone();
            tasks.spawn(async move {
                let outcome = pipeline.download(&uri).await;
                (uri, outcome)
            });
        }

        let mut batch = ImageBatch::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(ImageOutcome::Saved { .. }))) => batch.saved += 1,
                Ok((_, Ok(ImageOutcome::AlreadyDownloaded))) => batch.skipped += 1,
                Ok((_, Ok(ImageOutcome::FetchFailed { .. }))) => batch.failed += 1,
                Ok((uri, Err(e))) => {
                    tracing::warn!("Failed to save image {}: {}", uri, e);
                    batch.failed += 1;
                }
                Err(e) => {
                    tracing::error!("Image task failed: {}", e);
                    self.counters.record_image_failed();
                    batch.failed += 1;
                }
            }
        }
        batch
    }
}

/// Processes one page from fetch to persist
pub struct PagePipeline<F> {
    fetcher: Arc<F>,
    frontier: Arc<Frontier>,
    images: ImagePipeline<F>,
    persister: Arc<Persister>,
    counters: Arc<CrawlCounters>,
}

impl<F> Clone for PagePipeline<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            frontier: Arc::clone(&self.frontier),
            images: self.images.clone(),
            persister: Arc::clone(&self.persister),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<F: Fetch> PagePipeline<F> {
    pub fn new(
        fetcher: Arc<F>,
        frontier: Arc<Frontier>,
        images: ImagePipeline<F>,
        persister: Arc<Persister>,
        counters: Arc<CrawlCounters>,
    ) -> Self {
        Self {
            fetcher,
            frontier,
            images,
            persister,
            counters,
        }
    }

    /// Processes a dequeued page URI
    ///
    /// The URI is marked visited on every exit path, including errors and
    /// cancellation, so it is never retried.
    ///
    /// # Returns
    ///
    /// * `Ok(PageOutcome::Saved)` - Page written, links enqueued, images joined
    /// * `Ok(PageOutcome::FetchFailed)` - Fetch failed, nothing written
    /// * `Err(MirrorError)` - The page could not be written; its images are
    ///   not downloaded
    pub async fn process(&self, uri: CrawlUri) -> Result<PageOutcome> {
        let _visit = VisitGuard {
            frontier: &self.frontier,
            uri: &uri,
        };

        tracing::debug!("Fetching {}", uri);
        let body = match self.fetcher.fetch(&uri).await {
            FetchResult::Success { final_url, body } => {
                if final_url != uri.as_str() {
                    tracing::debug!("{} redirected to {}", uri, final_url);
                }
                body
            }
            failure => {
                let reason = failure.failure_reason().unwrap_or_default();
                tracing::warn!("Failed to fetch page {}: {}", uri, reason);
                self.counters.record_page_failed();
                return Ok(PageOutcome::FetchFailed { reason });
            }
        };

        // The parsed document is dropped inside extract_from_body, before any await
        let links = extract_from_body(&body);

        let mut links_enqueued = 0;
        let mut images = Vec::new();
        for link in links {
            match resolve_reference(&uri, &link.href) {
                Resolution::Crawlable(target) if link.kind.is_crawlable() => {
                    if self.frontier.try_enqueue(target.clone()) {
                        tracing::debug!("Enqueued {} (from {})", target, uri);
                        links_enqueued += 1;
                    }
                }
                Resolution::Crawlable(target) => {
                    if !images.contains(&target) {
                        images.push(target);
                    }
                }
                Resolution::External(href) => {
                    tracing::trace!("Skipping external link {} on {}", href, uri);
                }
                Resolution::Skipped => {}
            }
        }

        // Images only follow a page that made it to disk
        let path = match self.persister.write(&uri, &body).await {
            Ok(path) => path,
            Err(e) => {
                self.counters.record_page_failed();
                return Err(e);
            }
        };
        self.counters.record_page_saved(body.len());
        tracing::debug!("Saved {} to {}", uri, path.display());

        let batch = self.images.download_all(images).await;

        Ok(PageOutcome::Saved {
            path,
            links_enqueued,
            images_saved: batch.saved,
            images_failed: batch.failed,
        })
    }
}
