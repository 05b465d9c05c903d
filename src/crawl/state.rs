// src/crawl/state.rs
// =============================================================================
// The crawl's bookkeeping: which URLs we know about, and which still have
// to be visited.
//
// Two collections:
// - seen: every URL ever queued (visited or still waiting)
// - queue: URLs waiting to be visited, in the order they were discovered
//
// A URL goes into `seen` at the moment it is queued, not when it is
// visited. Two pages in the same batch linking to the same URL therefore
// queue it only once.
//
// Only the crawl loop touches this struct. Workers send URLs to the loop
// over a channel, so no locking is needed.
// =============================================================================

use std::collections::{HashSet, VecDeque};

#[derive(Debug)]
pub struct CrawlState {
    seen: HashSet<String>,
    queue: VecDeque<String>,
}

impl CrawlState {
    // Starts a crawl with only the entry URL queued
    pub fn new(entry: &str) -> Self {
        let mut state = Self {
            seen: HashSet::new(),
            queue: VecDeque::new(),
        };
        state.discover(entry.to_string());
        state
    }

    // Records a URL found on some page
    //
    // Returns true if the URL was new and has been queued
    pub fn discover(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }

        self.seen.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    // Takes up to `size` URLs from the front of the queue
    pub fn next_batch(&mut self, size: usize) -> Vec<String> {
        let take = size.min(self.queue.len());
        self.queue.drain(..take).collect()
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    pub fn into_seen(self) -> HashSet<String> {
        self.seen
    }
}
