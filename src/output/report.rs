//! Crawl counters and the end-of-crawl report

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters shared by all workers of one crawl
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pages_saved: AtomicUsize,
    pages_failed: AtomicUsize,
    images_saved: AtomicUsize,
    images_failed: AtomicUsize,
    bytes_written: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page_saved(&self, bytes: usize) {
        self.pages_saved.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_page_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_image_saved(&self, bytes: usize) {
        self.images_saved.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_image_failed(&self) {
        self.images_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_saved(&self) -> usize {
        self.pages_saved.load(Ordering::Relaxed)
    }

    pub fn pages_failed(&self) -> usize {
        self.pages_failed.load(Ordering::Relaxed)
    }

    pub fn images_saved(&self) -> usize {
        self.images_saved.load(Ordering::Relaxed)
    }

    pub fn images_failed(&self) -> usize {
        self.images_failed.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

/// Summary of a finished (or cancelled) crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The seed URI the crawl started from
    pub seed: String,

    /// Directory the mirror was written to
    pub root_dir: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Pages fetched and written
    pub pages_saved: usize,

    /// Pages skipped after a transport failure or a write failure
    pub pages_failed: usize,

    pub images_saved: usize,
    pub images_failed: usize,

    /// Total bytes written to disk
    pub bytes_written: u64,

    /// True if the crawl stopped on a shutdown request before draining
    pub cancelled: bool,
}

impl CrawlReport {
    /// Builds a report from the counters at the end of a crawl
    pub fn from_counters(
        seed: &str,
        root_dir: &str,
        started_at: DateTime<Utc>,
        counters: &CrawlCounters,
        cancelled: bool,
    ) -> Self {
        Self {
            seed: seed.to_string(),
            root_dir: root_dir.to_string(),
            started_at,
            finished_at: Utc::now(),
            pages_saved: counters.pages_saved(),
            pages_failed: counters.pages_failed(),
            images_saved: counters.images_saved(),
            images_failed: counters.images_failed(),
            bytes_written: counters.bytes_written(),
            cancelled,
        }
    }

    /// Total pages whose processing concluded
    pub fn pages_visited(&self) -> usize {
        self.pages_saved + self.pages_failed
    }

    /// Wall-clock duration of the crawl in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Percentage of visited pages that were saved
    pub fn success_rate(&self) -> f64 {
        let visited = self.pages_visited();
        if visited == 0 {
            0.0
        } else {
            (self.pages_saved as f64 / visited as f64) * 100.0
        }
    }
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Mirror Report ===\n");

    println!("Overview:");
    println!("  Seed: {}", report.seed);
    println!("  Output: {}", report.root_dir);
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Duration: {}s", report.duration_seconds());
    if report.cancelled {
        println!("  Status: cancelled before completion");
    }
    println!();

    println!("Pages:");
    println!("  Saved: {}", report.pages_saved);
    println!("  Failed: {}", report.pages_failed);
    println!();

    println!("Images:");
    println!("  Saved: {}", report.images_saved);
    println!("  Failed: {}", report.images_failed);
    println!();

    println!("Bytes written: {}", report.bytes_written);
    println!(
        "Success Rate: {:.1}% ({} / {} pages saved)",
        report.success_rate(),
        report.pages_saved,
        report.pages_visited()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let counters = CrawlCounters::new();
        counters.record_page_saved(100);
        counters.record_page_saved(50);
        counters.record_page_failed();
        counters.record_image_saved(10);
        counters.record_image_failed();

        assert_eq!(counters.pages_saved(), 2);
        assert_eq!(counters.pages_failed(), 1);
        assert_eq!(counters.images_saved(), 1);
        assert_eq!(counters.images_failed(), 1);
        assert_eq!(counters.bytes_written(), 160);
    }

    #[test]
    fn test_report_from_counters() {
        let counters = CrawlCounters::new();
        counters.record_page_saved(10);
        counters.record_page_saved(10);
        counters.record_page_saved(10);
        counters.record_page_failed();

        let report = CrawlReport::from_counters(
            "https://site.test/",
            "./root",
            Utc::now(),
            &counters,
            false,
        );

        assert_eq!(report.pages_visited(), 4);
        assert!((report.success_rate() - 75.0).abs() < f64::EPSILON);
        assert!(report.duration_seconds() >= 0);
        assert!(!report.cancelled);
    }

    #[test]
    fn test_success_rate_with_no_pages() {
        let report = CrawlReport::from_counters(
            "https://site.test/",
            "./root",
            Utc::now(),
            &CrawlCounters::new(),
            true,
        );
        assert_eq!(report.success_rate(), 0.0);
    }
}
