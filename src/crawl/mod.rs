// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Submodules:
// - page: Fetches one page and reports the same-host URLs it links to
// - state: The seen set and the queue of pages still to visit
// - queue: The crawl loop that runs pages in concurrent batches
//
// Features:
// - Breadth-first crawling starting from one URL
// - Same-host restriction (doesn't crawl external sites)
// - A bounded number of pages in flight at once
// - Clean stop on Ctrl-C with a partial result
// =============================================================================

mod page;
mod queue;
mod state;

pub use queue::{CrawlConfig, CrawlReport, Crawler};

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use url::Url;

// Turns the user's entry point into a URL
//
// Accepts an absolute URL ("https://example.com") or a path to a local
// HTML file ("./public/index.html"), which becomes a file:// URL.
pub fn parse_entry(entry: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(entry) {
        // "C:\site\index.html" parses as a URL with scheme "c"
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = Path::new(entry);
    if path.exists() {
        let absolute = path
            .canonicalize()
            .with_context(|| format!("Cannot resolve path '{}'", entry))?;
        return Url::from_file_path(&absolute)
            .map_err(|_| anyhow!("Cannot turn '{}' into a file URL", absolute.display()));
    }

    Err(anyhow!(
        "Invalid entry point '{}': expected an absolute URL or an existing file",
        entry
    ))
}
