// src/fetch/http.rs
// =============================================================================
// This module fetches web pages over HTTP(S).
//
// Key functionality:
// - One shared reqwest Client (connection pooling) with a request timeout
// - Non-2xx answers count as failures
// - The body is handed back as a stream of chunks, not one big String
// - Both the request and the body can be abandoned on cancellation
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - tokio::select!: Race the request against the cancellation token
// - Streams: For reading the body piece by piece
// =============================================================================

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{ByteStream, FetchError, Fetcher};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds the HTTP client
    //
    // Parameters:
    //   timeout: total time allowed for one request (including the body)
    //   user_agent: value of the User-Agent header
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<ByteStream, FetchError> {
        let request = self.client.get(url.clone()).send();

        // Whichever finishes first wins; the losing future is dropped,
        // which aborts the request
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = request => result.map_err(|e| categorize_error(url.as_str(), e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let source = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| categorize_error(&source, e))
            })
            .boxed();

        Ok(body)
    }
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure or refused connection
// - Broken connection while reading the body
fn categorize_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            message: error.to_string(),
        }
    } else {
        FetchError::Transport {
            url,
            message: error.to_string(),
        }
    }
}
