//! In-memory fetcher shared by the crawler unit tests

use crate::crawler::fetcher::{Fetch, FetchResult};
use crate::url::CrawlUri;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

/// Serves canned responses and counts requests per URI
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, FetchResult>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.respond(url, ok(url, html.as_bytes().to_vec()))
    }

    pub fn bytes(self, url: &str, body: &[u8]) -> Self {
        self.respond(url, ok(url, body.to_vec()))
    }

    pub fn status(self, url: &str, status_code: u16) -> Self {
        self.respond(url, FetchResult::HttpError { status_code })
    }

    fn respond(mut self, url: &str, result: FetchResult) -> Self {
        let key = CrawlUri::parse(url).unwrap().to_string();
        self.responses.insert(key, result);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        let key = CrawlUri::parse(url).unwrap().to_string();
        self.calls.lock().unwrap().get(&key).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

fn ok(url: &str, body: Vec<u8>) -> FetchResult {
    FetchResult::Success {
        final_url: url.to_string(),
        body,
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(&self, uri: &CrawlUri) -> impl Future<Output = FetchResult> + Send {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(uri.to_string())
            .or_insert(0) += 1;

        let result = self
            .responses
            .get(uri.as_str())
            .cloned()
            .unwrap_or(FetchResult::HttpError { status_code: 404 });

        async move {
            tokio::task::yield_now().await;
            result
        }
    }
}
