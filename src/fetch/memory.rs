// src/fetch/memory.rs
// =============================================================================
// An in-memory Fetcher for tests.
//
// Serves a fixed set of pages, counts how often each URL was requested, and
// can be told to hang forever on some pages (to test cancellation) or to
// fail right after sending the page (a connection dropped mid-body).
// Bodies are split into small chunks so tag and character boundaries get
// cut the way they would be on a real network.
// =============================================================================

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{ByteStream, FetchError, Fetcher};

const CHUNK: usize = 7;

#[derive(Default)]
pub struct MemoryFetcher {
    pages: HashMap<String, String>,
    stalled: HashSet<String>,
    broken: HashSet<String>,
    hits: Mutex<HashMap<String, usize>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    // The body of this page never finishes arriving
    pub fn stall(mut self, url: &str) -> Self {
        self.stalled.insert(url.to_string());
        self
    }

    // The body of this page arrives in full, then the stream fails
    pub fn break_off(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<ByteStream, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;

        if self.stalled.contains(url.as_str()) {
            let head = stream::iter(vec![Ok(b"<html><body>".to_vec())]);
            return Ok(head.chain(stream::pending()).boxed());
        }

        let html = self.pages.get(url.as_str()).ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })?;

        let mut chunks: Vec<Result<Vec<u8>, FetchError>> = html
            .as_bytes()
            .chunks(CHUNK)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();

        if self.broken.contains(url.as_str()) {
            chunks.push(Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection reset".to_string(),
            }));
        }

        Ok(stream::iter(chunks).boxed())
    }
}
