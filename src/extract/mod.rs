// src/extract/mod.rs
// =============================================================================
// This module finds hyperlinks in HTML.
//
// Submodules:
// - token: Turns bytes into a sequence of HTML tokens (start tag, end tag,
//          text, end of document)
// - links: A small state machine that turns those tokens into Links
//
// The two are kept apart so the crawler can feed a page to the tokenizer
// chunk by chunk while it downloads, and stop at any token if the crawl
// is cancelled.
// =============================================================================

mod links;
mod token;

pub use links::{Link, LinkExtractor};
pub use token::{HtmlTokenizer, Token};

use std::io::{self, Read};
use tokio_util::sync::CancellationToken;

// How many bytes we read from a local file at a time
const READ_CHUNK: usize = 8 * 1024;

// Extracts every link from an HTML document read from `reader`
//
// The document is read and tokenized in chunks, so large files are never
// loaded in full. Stops early (returning what was found so far) when
// `cancel` fires.
pub fn links_from_reader<R: Read>(
    mut reader: R,
    cancel: &CancellationToken,
) -> io::Result<Vec<Link>> {
    let mut tokenizer = HtmlTokenizer::new();
    let mut extractor = LinkExtractor::new();
    let mut links = Vec::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        if cancel.is_cancelled() {
            return Ok(links);
        }

        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        let tokens = tokenizer.feed(&buf[..read]);
        links.extend(extractor.links(tokens, cancel));
    }

    links.extend(extractor.links(tokenizer.finish(), cancel));
    Ok(links)
}
