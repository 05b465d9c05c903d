// src/crawl/queue.rs
// =============================================================================
// This module drives the crawl: breadth-first, in batches of concurrent
// page workers.
//
// How it works:
// 1. Start with the entry URL in the queue (and in the seen set)
// 2. Take up to `workers` URLs from the front of the queue
// 3. Start one worker per URL; each worker scans its page and sends the
//    same-host URLs it finds back over a channel
// 4. The loop reads that channel until every worker of the batch is done,
//    queueing each URL it has not seen before
// 5. Repeat until the queue is empty or the crawl is cancelled
//
// Only this loop changes the crawl state. Workers never share anything
// mutable; they just send URLs.
//
// Cancellation:
// - The same CancellationToken reaches the loop, every worker, and every
//   fetch. When it fires, workers drop what they are doing, the loop stops
//   starting batches, and whatever was discovered so far is returned.
// =============================================================================

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::page::{PageOutcome, PageStreamer};
use super::state::CrawlState;
use crate::fetch::Fetcher;

// Tunables for a crawl
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Pages fetched at the same time
    pub workers: usize,
    /// Time allowed for one page request
    pub timeout: Duration,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Discovered URLs that may wait for the crawl loop before workers pause
    pub discovery_buffer: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            timeout: Duration::from_secs(10),
            user_agent: concat!("sitemap-crawler/", env!("CARGO_PKG_VERSION")).to_string(),
            discovery_buffer: 64,
        }
    }
}

// What a finished (or cancelled) crawl found
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub entry: String,
    /// Every URL discovered, sorted
    pub urls: Vec<String>,
    pub pages_scanned: usize,
    pub pages_failed: usize,
    /// Same-host links reported by workers, duplicates included, counting
    /// pages that broke off after reporting some
    pub links_found: usize,
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct CrawlStats {
    scanned: usize,
    failed: usize,
    links: usize,
}

impl CrawlStats {
    fn record(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Scanned { links } => {
                self.scanned += 1;
                self.links += links;
            }
            PageOutcome::Unreachable { links } => {
                self.failed += 1;
                self.links += links;
            }
            PageOutcome::Cancelled => {}
        }
    }
}

pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    config: CrawlConfig,
    cancel: CancellationToken,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: CrawlConfig, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            config,
            cancel,
        }
    }

    // Crawls every page reachable from `entry` on the same host
    //
    // Never fails: unreachable pages are logged and counted, and a
    // cancelled crawl returns what it has found so far.
    pub async fn crawl(&self, entry: &Url) -> CrawlReport {
        let workers = self.config.workers.max(1);
        let streamer = PageStreamer::new(
            Arc::clone(&self.fetcher),
            entry.host_str().map(str::to_string),
            self.cancel.clone(),
        );

        let mut state = CrawlState::new(entry.as_str());
        let mut stats = CrawlStats::default();

        while !state.is_done() && !self.cancel.is_cancelled() {
            let batch = state.next_batch(workers);
            debug!(batch = batch.len(), pending = state.pending(), "starting batch");

            let (found_tx, mut found_rx) = mpsc::channel(self.config.discovery_buffer.max(1));
            let mut running = JoinSet::new();

            for url in batch {
                if url.is_empty() {
                    continue;
                }

                let page = match Url::parse(&url) {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(url = %url, error = %e, "skipping malformed URL");
                        stats.failed += 1;
                        continue;
                    }
                };

                info!(url = %page, "visiting");
                let streamer = streamer.clone();
                let found = found_tx.clone();
                running.spawn(async move { streamer.stream(&page, &page, found).await });
            }

            // Only the workers hold senders now, so the channel closes
            // exactly when the last worker of the batch is done
            drop(found_tx);

            loop {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break,
                    found = found_rx.recv() => match found {
                        Some(url) => {
                            if state.discover(url.clone()) {
                                debug!(url = %url, "queued");
                            }
                        }
                        None => break,
                    },
                }
            }

            // Workers blocked on a full channel fail their send and stop
            drop(found_rx);

            while let Some(joined) = running.join_next().await {
                match joined {
                    Ok(outcome) => stats.record(outcome),
                    Err(e) => {
                        warn!(error = %e, "page worker panicked");
                        stats.failed += 1;
                    }
                }
            }
        }

        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            info!(discovered = state.seen().len(), pending = state.pending(), "crawl cancelled");
        }

        let mut urls: Vec<String> = state.into_seen().into_iter().collect();
        urls.sort();

        CrawlReport {
            entry: entry.to_string(),
            urls,
            pages_scanned: stats.scanned,
            pages_failed: stats.failed,
            links_found: stats.links,
            cancelled,
        }
    }
}
