//! Progress reporting for the scheduler loop
//!
//! Observers are purely observational: they receive a [`FrontierSnapshot`]
//! after each scheduler step and have no way to feed back into the crawl.

use crate::crawler::frontier::FrontierSnapshot;
use std::time::Instant;

/// Milestone messages keyed by completion percentage
const MILESTONES: &[(u32, &str)] = &[
    (0, "Initializing..."),
    (5, "Checking permissions..."),
    (10, "Connecting to site..."),
    (15, "Analyzing page structure..."),
    (20, "Downloading HTML files..."),
    (25, "Fetching additional resources..."),
    (30, "Gathering images..."),
    (35, "Extracting metadata..."),
    (40, "Capturing scripts..."),
    (45, "Preparing for dynamic content..."),
    (50, "Halfway there! Processing data..."),
    (55, "Assembling the puzzle..."),
    (60, "Saving files locally..."),
    (65, "Sorting and organizing..."),
    (70, "Optimizing download speed..."),
    (75, "Conducting final checks..."),
    (80, "Verifying downloaded content..."),
    (85, "Enhancing user interface..."),
    (90, "Finalizing..."),
    (95, "Almost there! Wrapping up..."),
];

/// Receives frontier counts after every scheduler step
pub trait ProgressObserver: Send {
    fn on_step(&mut self, snapshot: FrontierSnapshot);
}

/// Fraction of known pages whose processing has concluded
pub fn completion_fraction(snapshot: &FrontierSnapshot) -> f64 {
    let total = snapshot.visited + snapshot.pending + snapshot.in_flight;
    if total == 0 {
        0.0
    } else {
        snapshot.visited as f64 / total as f64
    }
}

/// Picks the milestone message for a completion fraction
///
/// The fraction is rounded to the nearest 5% and matched against the nearest
/// table entry, so anything at or above 95% reads "Almost there!".
///
/// # Example
///
/// ```
/// use site_mirror::crawler::milestone_message;
///
/// assert_eq!(milestone_message(0.0), "Initializing...");
/// assert_eq!(milestone_message(0.51), "Halfway there! Processing data...");
/// ```
pub fn milestone_message(fraction: f64) -> &'static str {
    let percent = ((fraction.clamp(0.0, 1.0) * 100.0) / 5.0).round() as u32 * 5;

    MILESTONES
        .iter()
        .min_by_key(|(key, _)| key.abs_diff(percent))
        .map_or(MILESTONES[0].1, |&(_, message)| message)
}

/// Default observer: logs progress through `tracing`
///
/// Every step is logged at debug level. A line at info level is emitted each
/// time the milestone changes and every `log_every` visited pages.
#[derive(Debug)]
pub struct LogProgress {
    started: Instant,
    log_every: usize,
    last_milestone: Option<&'static str>,
    last_logged_visited: usize,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::with_interval(10)
    }

    pub fn with_interval(log_every: usize) -> Self {
        Self {
            started: Instant::now(),
            log_every: log_every.max(1),
            last_milestone: None,
            last_logged_visited: 0,
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for LogProgress {
    fn on_step(&mut self, snapshot: FrontierSnapshot) {
        let fraction = completion_fraction(&snapshot);
        let milestone = milestone_message(fraction);

        tracing::debug!(
            "Step: {} visited, {} pending, {} in flight",
            snapshot.visited,
            snapshot.pending,
            snapshot.in_flight
        );

        let milestone_changed = self.last_milestone != Some(milestone);
        let interval_reached = snapshot.visited >= self.last_logged_visited + self.log_every;

        if milestone_changed || interval_reached {
            let elapsed = self.started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                snapshot.visited as f64 / elapsed
            } else {
                0.0
            };
            tracing::info!(
                "Progress: {} pages visited, {} in frontier, {:.2} pages/sec ({:.0}%) {}",
                snapshot.visited,
                snapshot.pending,
                rate,
                fraction * 100.0,
                milestone
            );
            self.last_milestone = Some(milestone);
            self.last_logged_visited = snapshot.visited;
        }
    }
}
