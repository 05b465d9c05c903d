// src/fetch/mod.rs
// =============================================================================
// This module downloads pages for the crawler.
//
// Submodules:
// - http: Fetches http:// and https:// URLs with reqwest
// - file: Reads file:// URLs from disk (handy for crawling a local site)
//
// Everything goes through the Fetcher trait, so the crawler does not care
// where bytes come from. Tests plug in an in-memory fetcher instead.
//
// A fetch returns a *stream* of byte chunks rather than the whole body.
// The crawler can start scanning a page before it has fully arrived and
// can stop reading the moment the crawl is cancelled.
// =============================================================================

mod file;
mod http;
#[cfg(test)]
pub mod memory;

pub use file::FileFetcher;
pub use http::HttpFetcher;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use url::Url;

// A response body, delivered chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, FetchError>>;

// Everything that can go wrong while fetching a page
//
// None of these stop the crawl: the page is reported and treated as having
// no links.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{url} does not point to a local file")]
    NotAFile { url: String },

    #[error("unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { scheme: String, url: String },

    /// The crawl was cancelled while this fetch was in flight.
    /// Not a failure, callers should just stop quietly.
    #[error("fetch cancelled")]
    Cancelled,
}

// Something that can turn a URL into a stream of bytes
//
// Implementations must return FetchError::Cancelled promptly once `cancel`
// fires instead of finishing the request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<ByteStream, FetchError>;
}

// Picks the right fetcher for a URL based on its scheme
pub struct SourceFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl SourceFetcher {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            file: FileFetcher,
        }
    }
}

#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<ByteStream, FetchError> {
        match url.scheme() {
            "http" | "https" => self.http.fetch(url, cancel).await,
            "file" => self.file.fetch(url, cancel).await,
            other => Err(FetchError::UnsupportedScheme {
                scheme: other.to_string(),
                url: url.to_string(),
            }),
        }
    }
}
