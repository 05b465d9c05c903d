// src/crawl/page.rs
// =============================================================================
// This module scans one page and reports the same-host URLs it links to.
//
// How it works:
// 1. Fetch the page (a stream of byte chunks)
// 2. Pass chunks to a blocking task that tokenizes them and runs the
//    LinkExtractor over the tokens
// 3. Resolve each Link's href against the page URL
// 4. Keep only URLs on the crawl's host and send them to the crawler
//
// The two halves talk through a small bounded channel. If the crawler is
// slow to consume URLs, the scanner waits, which makes the reader wait,
// which stops us from buffering a whole page in memory.
//
// Why a blocking task?
// - html5ever's tokenizer is not Send, so it cannot live inside a tokio
//   task that may move between threads
// - Tokenizing is CPU work anyway; spawn_blocking keeps it off the async
//   worker threads
// =============================================================================

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::extract::{HtmlTokenizer, Link, LinkExtractor, Token};
use crate::fetch::{ByteStream, FetchError, Fetcher};

// How many body chunks may wait between the reader and the scanner
const CHUNK_BUFFER: usize = 4;

// What happened to a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was read to the end; `links` same-host URLs were reported
    Scanned { links: usize },
    /// The page could not be fetched, or broke off after `links` URLs were
    /// already reported
    Unreachable { links: usize },
    /// The crawl was cancelled before the page was finished
    Cancelled,
}

// Scans pages on behalf of the crawler
//
// Cheap to clone: one clone is moved into every worker task.
#[derive(Clone)]
pub struct PageStreamer {
    fetcher: Arc<dyn Fetcher>,
    host: Option<String>,
    cancel: CancellationToken,
}

impl PageStreamer {
    // Parameters:
    //   fetcher: where page bytes come from
    //   host: only URLs with this host are reported (None = URLs without a
    //         host, as with file:// URLs)
    //   cancel: stops every page in progress when fired
    pub fn new(fetcher: Arc<dyn Fetcher>, host: Option<String>, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            host,
            cancel,
        }
    }

    // Fetches `source` and sends every same-host URL it links to into `found`
    //
    // Relative links are resolved against `base`, which is normally the same
    // URL as `source`.
    pub async fn stream(&self, source: &Url, base: &Url, found: mpsc::Sender<String>) -> PageOutcome {
        let body = match self.fetcher.fetch(source, &self.cancel).await {
            Ok(body) => body,
            Err(FetchError::Cancelled) => return PageOutcome::Cancelled,
            Err(e) => {
                warn!(url = %source, error = %e, "failed to fetch page");
                return PageOutcome::Unreachable { links: 0 };
            }
        };

        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_BUFFER);
        let scanner = PageScanner {
            base: base.clone(),
            host: self.host.clone(),
            cancel: self.cancel.clone(),
        };
        let scan = tokio::task::spawn_blocking(move || scanner.run(chunk_rx, found));

        // chunk_tx is moved in and dropped when reading stops, which tells
        // the scanner there is nothing more to come
        let read = pump(body, chunk_tx, &self.cancel).await;

        let links = match scan.await {
            Ok(links) => links,
            Err(e) => {
                warn!(url = %source, error = %e, "page scanner failed");
                return PageOutcome::Unreachable { links: 0 };
            }
        };

        match read {
            Ok(()) if self.cancel.is_cancelled() => PageOutcome::Cancelled,
            Ok(()) => PageOutcome::Scanned { links },
            Err(FetchError::Cancelled) => PageOutcome::Cancelled,
            Err(e) => {
                warn!(url = %source, error = %e, links, "page body broke off");
                PageOutcome::Unreachable { links }
            }
        }
    }
}

// Copies body chunks into the scanner's channel until the body ends,
// fails, or the crawl is cancelled
async fn pump(
    mut body: ByteStream,
    chunks: mpsc::Sender<Vec<u8>>,
    cancel: &CancellationToken,
) -> Result<(), FetchError> {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            next = body.next() => next,
        };

        match next {
            None => return Ok(()),
            Some(Err(e)) => return Err(e),
            Some(Ok(chunk)) => {
                if chunks.send(chunk).await.is_err() {
                    // The scanner stopped early (cancelled or nobody listening)
                    return Ok(());
                }
            }
        }
    }
}

// The blocking half: tokenizer + extractor + same-host filter
struct PageScanner {
    base: Url,
    host: Option<String>,
    cancel: CancellationToken,
}

impl PageScanner {
    // Returns how many URLs were sent
    fn run(self, mut chunks: mpsc::Receiver<Vec<u8>>, found: mpsc::Sender<String>) -> usize {
        let mut tokenizer = HtmlTokenizer::new();
        let mut extractor = LinkExtractor::new();
        let mut sent = 0;

        while let Some(chunk) = chunks.blocking_recv() {
            let tokens = tokenizer.feed(&chunk);
            if !self.forward(&mut extractor, tokens, &found, &mut sent) {
                return sent;
            }
        }

        if !self.cancel.is_cancelled() {
            let tokens = tokenizer.finish();
            self.forward(&mut extractor, tokens, &found, &mut sent);
        }

        sent
    }

    // Runs the extractor over `tokens` and sends the URLs worth crawling.
    // Returns false when scanning should stop.
    fn forward(
        &self,
        extractor: &mut LinkExtractor,
        tokens: Vec<Token>,
        found: &mpsc::Sender<String>,
        sent: &mut usize,
    ) -> bool {
        for link in extractor.links(tokens, &self.cancel) {
            let Some(url) = same_host_url(&self.base, self.host.as_deref(), &link) else {
                continue;
            };

            // Blocks while the crawler's channel is full; fails once the
            // crawler has stopped listening
            if found.blocking_send(url.into()).is_err() {
                return false;
            }
            *sent += 1;
        }

        !self.cancel.is_cancelled()
    }
}

// Resolves a link against the page URL and keeps it only if it stays on `host`
//
// Examples (base = "https://example.com/docs/", host = "example.com"):
//   "intro"                 -> Some("https://example.com/docs/intro")
//   "/about"                -> Some("https://example.com/about")
//   "https://other.com/"    -> None (different host)
//   "mailto:me@example.com" -> None (not a page)
//   "http://[::1"           -> None (does not parse)
pub fn same_host_url(base: &Url, host: Option<&str>, link: &Link) -> Option<Url> {
    let resolved = match base.join(&link.href) {
        Ok(url) => url,
        Err(e) => {
            debug!(base = %base, href = %link.href, error = %e, "skipping unresolvable link");
            return None;
        }
    };

    // mailto:, javascript: and friends have no host either, so a file://
    // crawl would otherwise take them for local pages
    match (page_scheme(base), page_scheme(&resolved)) {
        (Some(site), Some(target)) if site == target => {}
        _ => return None,
    }

    if resolved.host_str() != host {
        return None;
    }

    Some(resolved)
}

#[derive(PartialEq, Eq)]
enum PageScheme {
    Web,
    File,
}

// http and https count as one site; anything we cannot fetch is None
fn page_scheme(url: &Url) -> Option<PageScheme> {
    match url.scheme() {
        "http" | "https" => Some(PageScheme::Web),
        "file" => Some(PageScheme::File),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::memory::MemoryFetcher;

    fn link(href: &str) -> Link {
        Link {
            href: href.to_string(),
            text: String::new(),
        }
    }

    fn resolve(base: &str, href: &str) -> Option<String> {
        let base = Url::parse(base).unwrap();
        let host = base.host_str().map(str::to_string);
        same_host_url(&base, host.as_deref(), &link(href)).map(|u| u.to_string())
    }

    async fn scan(fetcher: MemoryFetcher, page: &str) -> (PageOutcome, Vec<String>) {
        let url = Url::parse(page).unwrap();
        let streamer = PageStreamer::new(
            Arc::new(fetcher),
            url.host_str().map(str::to_string),
            CancellationToken::new(),
        );

        let (tx, mut rx) = mpsc::channel(16);
        let outcome = streamer.stream(&url, &url, tx).await;

        let mut urls = Vec::new();
        while let Some(url) = rx.recv().await {
            urls.push(url);
        }
        (outcome, urls)
    }

    #[test]
    fn test_resolve_relative_links() {
        assert_eq!(
            resolve("https://example.com/docs/", "intro"),
            Some("https://example.com/docs/intro".to_string())
        );
        assert_eq!(
            resolve("https://example.com/docs/", "/about"),
            Some("https://example.com/about".to_string())
        );
        assert_eq!(
            resolve("https://example.com/docs/page", "../up"),
            Some("https://example.com/up".to_string())
        );
    }

    #[test]
    fn test_fragment_links_stay_distinct() {
        assert_eq!(
            resolve("https://example.com/page", "#section"),
            Some("https://example.com/page#section".to_string())
        );
        assert_eq!(
            resolve("https://example.com/page", ""),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn test_other_hosts_are_dropped() {
        assert_eq!(resolve("https://example.com/", "https://other.com/x"), None);
        assert_eq!(resolve("https://example.com/", "https://sub.example.com/"), None);
        assert_eq!(resolve("https://example.com/", "mailto:me@example.com"), None);
    }

    #[test]
    fn test_port_does_not_change_host() {
        assert_eq!(
            resolve("http://example.com/", "http://example.com:8080/x"),
            Some("http://example.com:8080/x".to_string())
        );
    }

    #[test]
    fn test_unresolvable_link_is_skipped() {
        assert_eq!(resolve("https://example.com/", "http://[::1"), None);
    }

    #[test]
    fn test_file_urls_share_the_empty_host() {
        let base = Url::parse("file:///site/index.html").unwrap();
        let url = same_host_url(&base, None, &link("about.html")).unwrap();
        assert_eq!(url.as_str(), "file:///site/about.html");
    }

    #[test]
    fn test_file_crawl_skips_links_that_are_not_pages() {
        let base = Url::parse("file:///site/index.html").unwrap();
        for href in [
            "mailto:me@example.com",
            "javascript:void(0)",
            "tel:+123",
            "data:text/html,<p>hi</p>",
            "https://example.com/",
        ] {
            assert_eq!(same_host_url(&base, None, &link(href)), None, "{href}");
        }
    }

    #[test]
    fn test_http_and_https_are_the_same_site() {
        assert_eq!(
            resolve("http://example.com/", "https://example.com/secure"),
            Some("https://example.com/secure".to_string())
        );
    }

    #[tokio::test]
    async fn test_stream_page_urls() {
        let fetcher = MemoryFetcher::new().page(
            "https://example.com/",
            r#"<a href="/a">A</a> <a href="https://elsewhere.org/">off</a> <a href="b">B</a>"#,
        );

        let (outcome, urls) = scan(fetcher, "https://example.com/").await;
        assert_eq!(outcome, PageOutcome::Scanned { links: 2 });
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[tokio::test]
    async fn test_missing_page_yields_nothing() {
        let (outcome, urls) = scan(MemoryFetcher::new(), "https://example.com/gone").await;
        assert_eq!(outcome, PageOutcome::Unreachable { links: 0 });
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_broken_body_keeps_links_already_sent() {
        let fetcher = MemoryFetcher::new()
            .page("https://example.com/", r#"<a href="/a">A</a> <a href="/b">B</a>"#)
            .break_off("https://example.com/");

        let (outcome, urls) = scan(fetcher, "https://example.com/").await;
        assert_eq!(outcome, PageOutcome::Unreachable { links: 2 });
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[tokio::test]
    async fn test_cancelled_page_stops() {
        let fetcher = MemoryFetcher::new().stall("https://example.com/slow");
        let url = Url::parse("https://example.com/slow").unwrap();
        let cancel = CancellationToken::new();
        let streamer = PageStreamer::new(
            Arc::new(fetcher),
            Some("example.com".to_string()),
            cancel.clone(),
        );

        let (tx, _rx) = mpsc::channel(16);
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            streamer.stream(&url, &url, tx),
        )
        .await
        .expect("page did not stop after cancellation");

        assert_eq!(outcome, PageOutcome::Cancelled);
        canceller.await.unwrap();
    }
}
