// src/extract/links.rs
// =============================================================================
// This module pulls hyperlinks out of a stream of HTML tokens.
//
// How it works:
// - Every <a> start tag pushes a frame onto a stack
// - Text tokens are appended to the frame on top of the stack
// - Every </a> pops the top frame and, if the anchor had an href,
//   produces a Link with the collected text
//
// Because it is a stack, nested anchors work too:
//   <a href="/dog">outer <a href="/dog/golden">golden</a> retriever</a>
// produces {"/dog/golden", "golden"} first, then {"/dog", "outer retriever"}.
//
// Rust concepts:
// - Option<String>: An anchor frame may or may not have an href
// - Iterators: links() wraps any token source in a lazy Link iterator
// - Borrowing: the iterator borrows the extractor mutably so its state
//   survives across several batches of tokens
// =============================================================================

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::token::Token;

// A hyperlink found in a page
//
// href is the raw attribute value (may be relative, empty, or "#...")
// text is the anchor's text with whitespace collapsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

#[cfg(test)]
impl Link {
    pub fn new(href: &str, text: &str) -> Self {
        Self {
            href: href.to_string(),
            text: text.to_string(),
        }
    }
}

// One currently-open <a> element
#[derive(Debug, Default)]
struct AnchorFrame {
    href: Option<String>,
    text: String,
}

// The anchor-tracking state machine
#[derive(Debug, Default)]
pub struct LinkExtractor {
    frames: Vec<AnchorFrame>,
    done: bool,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    // Number of anchors opened but not yet closed
    #[cfg(test)]
    pub fn open_anchors(&self) -> usize {
        self.frames.len()
    }

    // Processes one token. Returns a Link when the token closes an anchor
    // that had an href.
    pub fn push(&mut self, token: Token) -> Option<Link> {
        if self.done {
            return None;
        }

        match token {
            Token::StartTag { name, attrs } if name == "a" => {
                let href = attrs
                    .into_iter()
                    .find(|(key, _)| key == "href")
                    .map(|(_, value)| value);
                self.frames.push(AnchorFrame {
                    href,
                    text: String::new(),
                });
                None
            }
            Token::EndTag { name } if name == "a" => {
                // A stray </a> has no frame to close
                let frame = self.frames.pop()?;
                // Anchors without href are dropped, text and all
                let href = frame.href?;
                Some(Link {
                    href,
                    text: normalize_text(&frame.text),
                })
            }
            Token::Text(content) => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.text.push_str(&content);
                }
                None
            }
            Token::End => {
                // Anchors still open at the end of the document are discarded
                self.frames.clear();
                self.done = true;
                None
            }
            _ => None,
        }
    }

    // Wraps a token source in a lazy iterator of Links.
    //
    // The iterator stops as soon as the cancellation token fires (checked
    // before every token), when the tokens run out, or after Token::End.
    pub fn links<'a, I>(
        &'a mut self,
        tokens: I,
        cancel: &'a CancellationToken,
    ) -> Links<'a, I::IntoIter>
    where
        I: IntoIterator<Item = Token>,
    {
        Links {
            extractor: self,
            tokens: tokens.into_iter(),
            cancel,
        }
    }
}

// Iterator returned by LinkExtractor::links()
pub struct Links<'a, I> {
    extractor: &'a mut LinkExtractor,
    tokens: I,
    cancel: &'a CancellationToken,
}

impl<I> Iterator for Links<'_, I>
where
    I: Iterator<Item = Token>,
{
    type Item = Link;

    fn next(&mut self) -> Option<Link> {
        loop {
            if self.extractor.done || self.cancel.is_cancelled() {
                return None;
            }

            let token = self.tokens.next()?;
            if let Some(link) = self.extractor.push(token) {
                return Some(link);
            }
        }
    }
}

// Collapses whitespace in anchor text
//
// Splits on spaces, trims every piece and glues the non-empty pieces back
// together with single spaces:
//   "  Something \n in   a span " -> "Something in a span"
pub fn normalize_text(text: &str) -> String {
    text.split(' ')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
