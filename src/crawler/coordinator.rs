//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the crawl together:
//! - Seeding the Frontier and processing the root page
//! - Building the page and image pipelines over shared state
//! - Running the scheduler to completion or shutdown
//! - Producing the final report

use crate::config::{validate_seed_url, Config};
use crate::crawler::fetcher::{Fetch, HttpFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::pipeline::{ImagePipeline, PageOutcome, PagePipeline};
use crate::crawler::progress::{LogProgress, ProgressObserver};
use crate::crawler::scheduler::Scheduler;
use crate::output::{CrawlCounters, CrawlReport, Persister};
use crate::url::CrawlUri;
use crate::{MirrorError, Result};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

/// Main crawler coordinator structure
pub struct Coordinator<F: Fetch = HttpFetcher> {
    config: Arc<Config>,
    fetcher: Arc<F>,
    observer: Box<dyn ProgressObserver>,
}

impl Coordinator<HttpFetcher> {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MirrorError)` - The configuration is invalid or the HTTP client
    ///   could not be built
    pub fn new(config: Config) -> Result<Self> {
        crate::config::validate(&config)?;
        let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: Fetch> Coordinator<F> {
    /// Creates a coordinator over any [`Fetch`] implementation
    pub fn with_fetcher(config: Config, fetcher: F) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            observer: Box::new(LogProgress::new()),
        }
    }

    /// Replaces the default logging progress observer
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the crawl until the Frontier is drained
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until the Frontier is drained or `shutdown` resolves
    ///
    /// The seed page is processed on its own first. If it cannot be fetched the
    /// crawl stops with [`MirrorError::RootUnreachable`] and nothing is written.
    pub async fn run_until<S>(&mut self, shutdown: S) -> Result<CrawlReport>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let started_at = Utc::now();
        let seed_str = self.config.seed.base_url.as_str();
        validate_seed_url(seed_str)?;
        let seed = CrawlUri::parse(seed_str)?;
        let root_dir = self.config.output.root_dir.clone();

        let frontier = Arc::new(Frontier::new());
        let counters = Arc::new(CrawlCounters::new());
        let persister = Arc::new(Persister::new(
            &root_dir,
            self.config.output.index_file_name.as_str(),
        ));
        let images = ImagePipeline::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&persister),
            Arc::clone(&counters),
            self.config.crawler.max_concurrent_images as usize,
            self.config.crawler.dedupe_images,
        );
        let pages = PagePipeline::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&frontier),
            images,
            persister,
            Arc::clone(&counters),
        );

        tracing::info!("Starting crawl of {} into {}", seed, root_dir);

        frontier.try_enqueue(seed.clone());
        let Some(root) = frontier.try_dequeue() else {
            return Err(MirrorError::RootUnreachable {
                url: seed.to_string(),
                reason: "seed was not admitted to the frontier".to_string(),
            });
        };

        let root_outcome = tokio::select! {
            outcome = pages.process(root) => outcome?,
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested before the seed page completed");
                return Ok(CrawlReport::from_counters(
                    seed.as_str(),
                    &root_dir,
                    started_at,
                    &counters,
                    true,
                ));
            }
        };
        if let PageOutcome::FetchFailed { reason } = root_outcome {
            tracing::error!("Seed page {} is unreachable: {}", seed, reason);
            return Err(MirrorError::RootUnreachable {
                url: seed.to_string(),
                reason,
            });
        }

        let mut scheduler = Scheduler::new(
            Arc::clone(&frontier),
            self.config.crawler.max_concurrent_pages as usize,
        );
        let worker_pages = pages.clone();
        let summary = scheduler
            .run(
                move |uri| {
                    let pages = worker_pages.clone();
                    async move { pages.process(uri).await }
                },
                self.observer.as_mut(),
                shutdown,
            )
            .await;

        let report = CrawlReport::from_counters(
            seed.as_str(),
            &root_dir,
            started_at,
            &counters,
            summary.cancelled,
        );

        if report.cancelled {
            tracing::info!(
                "Crawl cancelled: {} pages saved, {} still pending",
                report.pages_saved,
                frontier.pending_count()
            );
        } else {
            tracing::info!(
                "Crawl completed: {} pages and {} images saved in {}s",
                report.pages_saved,
                report.images_saved,
                report.duration_seconds()
            );
        }

        Ok(report)
    }
}

/// Runs a complete crawl with the HTTP fetcher
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::load_config;
/// use site_mirror::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("mirror.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("{} pages saved", report.pages_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::frontier::FrontierSnapshot;
    use crate::crawler::testing::MemoryFetcher;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir, seed: &str) -> Config {
        let mut config = Config::default();
        config.seed.base_url = seed.to_string();
        config.output.root_dir = dir.path().to_string_lossy().into_owned();
        config.crawler.max_concurrent_pages = 2;
        config
    }

    #[derive(Clone, Default)]
    struct SharedObserver(Arc<Mutex<Vec<FrontierSnapshot>>>);

    impl ProgressObserver for SharedObserver {
        fn on_step(&mut self, snapshot: FrontierSnapshot) {
            self.0.lock().unwrap().push(snapshot);
        }
    }

    #[tokio::test]
    async fn test_crawls_whole_site_once() {
        let dir = TempDir::new().unwrap();
        let fetcher = MemoryFetcher::new()
            .page(
                "https://site.test/",
                r#"<a href="/a">A</a><a href="/b">B</a><a href="https://other.example/c">C</a>"#,
            )
            .page("https://site.test/a", r#"<a href="/">home</a><a href="b">B</a>"#)
            .page("https://site.test/b", r#"<a href="/a">A</a>"#);
        let observer = SharedObserver::default();
        let steps = Arc::clone(&observer.0);

        let mut coordinator =
            Coordinator::with_fetcher(config_for(&dir, "https://site.test/"), fetcher)
                .with_observer(observer);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.pages_saved, 3);
        assert_eq!(report.pages_failed, 0);
        assert!(!report.cancelled);
        assert!(dir.path().join("index.html").exists());
        assert!(dir.path().join("a").exists());
        assert!(dir.path().join("b").exists());

        let fetcher = &coordinator.fetcher;
        assert_eq!(fetcher.calls("https://site.test/"), 1);
        assert_eq!(fetcher.calls("https://site.test/a"), 1);
        assert_eq!(fetcher.calls("https://site.test/b"), 1);
        assert_eq!(fetcher.calls("https://other.example/c"), 0);

        let steps = steps.lock().unwrap();
        assert_eq!(steps.last().map(|s| s.visited), Some(3));
    }

    #[tokio::test]
    async fn test_root_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let fetcher = MemoryFetcher::new().status("https://site.test/", 503);

        let mut coordinator =
            Coordinator::with_fetcher(config_for(&dir, "https://site.test/"), fetcher);
        let result = coordinator.run().await;

        assert!(matches!(result, Err(MirrorError::RootUnreachable { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(coordinator.fetcher.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut coordinator =
            Coordinator::with_fetcher(config_for(&dir, "ftp://site.test/"), MemoryFetcher::new());

        let result = coordinator.run().await;
        assert!(matches!(result, Err(MirrorError::Config(_))));
    }

    #[tokio::test]
    async fn test_shutdown_before_start_reports_cancelled() {
        let dir = TempDir::new().unwrap();
        let fetcher = MemoryFetcher::new().page("https://site.test/", "<p>home</p>");

        let mut coordinator =
            Coordinator::with_fetcher(config_for(&dir, "https://site.test/"), fetcher);
        let report = coordinator.run_until(async {}).await.unwrap();

        assert!(report.cancelled);
    }
}
