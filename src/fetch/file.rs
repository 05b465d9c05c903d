// src/fetch/file.rs
// =============================================================================
// Reads file:// URLs from disk.
//
// This lets the crawler walk a site that lives in a local folder, e.g. the
// output directory of a static site generator, without starting a server.
// =============================================================================

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{ByteStream, FetchError, Fetcher};

pub struct FileFetcher;

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<ByteStream, FetchError> {
        let path = url.to_file_path().map_err(|_| FetchError::NotAFile {
            url: url.to_string(),
        })?;

        let file = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            opened = tokio::fs::File::open(&path) => opened.map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?,
        };

        let body = ReaderStream::new(file)
            .map(move |chunk| {
                chunk.map(|bytes| bytes.to_vec()).map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })
            })
            .boxed();

        Ok(body)
    }
}
