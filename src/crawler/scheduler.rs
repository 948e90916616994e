//! Bounded-concurrency scheduler for page workers
//!
//! This module handles:
//! - Pulling URIs from the Frontier in FIFO order
//! - Keeping at most `max_concurrent` page workers active
//! - Awaiting any worker's completion before re-evaluating the Frontier
//! - Stopping early when a shutdown future resolves

use crate::crawler::frontier::Frontier;
use crate::crawler::pipeline::PageOutcome;
use crate::crawler::progress::ProgressObserver;
use crate::url::CrawlUri;
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Work is pending in the Frontier
    Running,
    /// The Frontier is empty but workers are still active and may enqueue more
    Draining,
    /// Nothing pending and no active workers
    Idle,
    /// The run loop has returned
    Done,
}

/// Totals from one scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    /// Workers that saved their page
    pub completed: usize,
    /// Workers that failed to fetch or persist, or panicked
    pub failed: usize,
    /// True if the run stopped on shutdown rather than by draining
    pub cancelled: bool,
}

/// Drives the crawl with a bounded pool of concurrent workers
pub struct Scheduler {
    frontier: Arc<Frontier>,
    max_concurrent: usize,
    phase: SchedulerPhase,
}

impl Scheduler {
    /// Creates a new scheduler over a shared Frontier
    ///
    /// A limit of zero is treated as one.
    pub fn new(frontier: Arc<Frontier>, max_concurrent: usize) -> Self {
        Self {
            frontier,
            max_concurrent: max_concurrent.max(1),
            phase: SchedulerPhase::Idle,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// Runs workers until the Frontier is drained or `shutdown` resolves
    ///
    /// Each loop iteration:
    /// 1. Launches workers while below the limit and a dequeue succeeds
    /// 2. Returns if no worker is active (the Frontier is then empty too)
    /// 3. Waits for any one worker to finish, or for shutdown
    /// 4. Reports the Frontier counts to `observer`
    ///
    /// Worker errors are logged and counted; they never stop the loop. On
    /// shutdown all active workers are aborted and awaited before returning.
    pub async fn run<W, Fut, S>(
        &mut self,
        worker: W,
        observer: &mut dyn ProgressObserver,
        shutdown: S,
    ) -> ScheduleSummary
    where
        W: Fn(CrawlUri) -> Fut,
        Fut: Future<Output = Result<PageOutcome>> + Send + 'static,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut workers: JoinSet<Result<PageOutcome>> = JoinSet::new();
        let mut summary = ScheduleSummary::default();
        self.phase = SchedulerPhase::Running;

        loop {
            while workers.len() < self.max_concurrent {
                let Some(uri) = self.frontier.try_dequeue() else {
                    break;
                };
                tracing::debug!("Dispatching {}", uri);
                workers.spawn(worker(uri));
            }

            if workers.is_empty() {
                self.phase = SchedulerPhase::Idle;
                break;
            }

            self.phase = if self.frontier.pending_count() > 0 {
                SchedulerPhase::Running
            } else {
                SchedulerPhase::Draining
            };

            tokio::select! {
                joined = workers.join_next() => {
                    if let Some(joined) = joined {
                        record(&mut summary, joined);
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, aborting {} active workers", workers.len());
                    workers.abort_all();
                    while let Some(joined) = workers.join_next().await {
                        match joined {
                            Err(e) if e.is_cancelled() => {}
                            joined => record(&mut summary, joined),
                        }
                    }
                    summary.cancelled = true;
                    self.phase = SchedulerPhase::Idle;
                    break;
                }
            }

            observer.on_step(self.frontier.snapshot());
        }

        self.phase = SchedulerPhase::Done;
        tracing::debug!(
            "Scheduler done: {} completed, {} failed, cancelled={}",
            summary.completed,
            summary.failed,
            summary.cancelled
        );
        summary
    }
}

fn record(
    summary: &mut ScheduleSummary,
    joined: std::result::Result<Result<PageOutcome>, JoinError>,
) {
    match joined {
        Ok(Ok(PageOutcome::Saved { .. })) => summary.completed += 1,
        Ok(Ok(PageOutcome::FetchFailed { .. })) => summary.failed += 1,
        Ok(Err(e)) => {
            tracing::warn!("Page worker failed: {}", e);
            summary.failed += 1;
        }
        Err(e) => {
            tracing::error!("Page worker panicked or was aborted: {}", e);
            summary.failed += 1;
        }
    }
}
