//! Frontier and visited-set bookkeeping
//!
//! A single mutex owns the pending queue together with the in-flight and visited
//! sets. Callers only get the atomic operations below, never the collections, so
//! the check-then-insert in [`Frontier::try_enqueue`] cannot be split.

use crate::url::CrawlUri;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Point-in-time counts, used for progress reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierSnapshot {
    /// URIs waiting in the queue
    pub pending: usize,
    /// URIs held by an active worker
    pub in_flight: usize,
    /// URIs whose processing has concluded
    pub visited: usize,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<CrawlUri>,
    queued: HashSet<CrawlUri>,
    in_flight: HashSet<CrawlUri>,
    visited: HashSet<CrawlUri>,
}

impl FrontierState {
    fn is_known(&self, uri: &CrawlUri) -> bool {
        self.visited.contains(uri) || self.in_flight.contains(uri) || self.queued.contains(uri)
    }
}

/// FIFO queue of page URIs with admission control
///
/// Every URI moves Frontier → in-flight → visited and enters the Frontier at
/// most once over the crawl's lifetime.
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves the sets consistent, so a poisoned lock is
    // still safe to use.
    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `uri` unless it is already queued, in flight or visited
    ///
    /// Returns true if the URI was added.
    pub fn try_enqueue(&self, uri: CrawlUri) -> bool {
        let mut state = self.lock();
        if state.is_known(&uri) {
            return false;
        }
        state.queued.insert(uri.clone());
        state.queue.push_back(uri);
        true
    }

    /// Pops the oldest pending URI and marks it in flight
    pub fn try_dequeue(&self) -> Option<CrawlUri> {
        let mut state = self.lock();
        let uri = state.queue.pop_front()?;
        state.queued.remove(&uri);
        state.in_flight.insert(uri.clone());
        Some(uri)
    }

    /// Moves `uri` from in flight to visited
    ///
    /// Visiting is final: calling this twice, or for a URI that was never
    /// dequeued, still leaves it visited exactly once.
    pub fn mark_visited(&self, uri: &CrawlUri) {
        let mut state = self.lock();
        state.in_flight.remove(uri);
        state.visited.insert(uri.clone());
    }

    /// Number of URIs waiting to be dequeued
    pub fn pending_count(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of URIs whose processing has concluded
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Number of URIs currently held by workers
    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Returns true if the URI has concluded processing
    pub fn is_visited(&self, uri: &CrawlUri) -> bool {
        self.lock().visited.contains(uri)
    }

    /// Returns true if nothing is pending and nothing is in flight
    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.queue.is_empty() && state.in_flight.is_empty()
    }

    /// All three counts, read under one lock
    pub fn snapshot(&self) -> FrontierSnapshot {
        let state = self.lock();
        FrontierSnapshot {
            pending: state.queue.len(),
            in_flight: state.in_flight.len(),
            visited: state.visited.len(),
        }
    }
}
