// src/extract/token.rs
// =============================================================================
// This module turns raw HTML bytes into a flat sequence of tokens.
//
// We don't build a DOM here. The crawler only cares about <a> tags and the
// text between them, so a tokenizer is enough, and it lets us scan a page
// while it is still downloading.
//
// The heavy lifting is done by html5ever's tokenizer (the same parser that
// scraper uses internally). This file adapts it to our own small Token enum
// and makes it incremental: bytes can be fed in arbitrary chunks.
// =============================================================================

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token as RawToken, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

// One lexical item of an HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An opening tag such as <a href="/docs">
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// A closing tag such as </a>
    EndTag { name: String },
    /// Character data between tags
    Text(String),
    /// End of the document; nothing follows it
    End,
}

#[cfg(test)]
impl Token {
    // Convenience constructors for tests
    pub fn start(name: &str, attrs: &[(&str, &str)]) -> Self {
        Token::StartTag {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn end(name: &str) -> Self {
        Token::EndTag {
            name: name.to_string(),
        }
    }

    pub fn text(content: &str) -> Self {
        Token::Text(content.to_string())
    }
}

// Receives tokens from html5ever and converts them to our Token type
#[derive(Default)]
struct Collector {
    tokens: Vec<Token>,
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&mut self, token: RawToken, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            RawToken::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => {
                        let switch = raw_state_for(&name);
                        let attrs = tag
                            .attrs
                            .into_iter()
                            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                            .collect();
                        self.tokens.push(Token::StartTag { name, attrs });
                        if let Some(result) = switch {
                            return result;
                        }
                    }
                    TagKind::EndTag => self.tokens.push(Token::EndTag { name }),
                }
            }
            RawToken::CharacterTokens(text) => self.tokens.push(Token::Text(text.to_string())),
            RawToken::EOFToken => self.tokens.push(Token::End),
            // Comments, doctypes, NUL characters and parse error notices
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

// Elements whose content is not markup. Without a tree builder the tokenizer
// has to be told to switch state, otherwise "<a" inside a <script> would be
// read as a real tag.
fn raw_state_for(tag: &str) -> Option<TokenSinkResult<()>> {
    match tag {
        "script" => Some(TokenSinkResult::RawData(RawKind::ScriptData)),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            Some(TokenSinkResult::RawData(RawKind::Rawtext))
        }
        "textarea" | "title" => Some(TokenSinkResult::RawData(RawKind::Rcdata)),
        "plaintext" => Some(TokenSinkResult::Plaintext),
        _ => None,
    }
}

// Incremental HTML tokenizer
//
// Usage:
//   let mut tokenizer = HtmlTokenizer::new();
//   for chunk in body { tokens.extend(tokenizer.feed(&chunk)); }
//   tokens.extend(tokenizer.finish());   // always ends with Token::End
//
// Note: html5ever uses non-atomic reference counting internally, so this
// type cannot move between threads. Keep it inside one blocking task.
pub struct HtmlTokenizer {
    inner: Tokenizer<Collector>,
    input: BufferQueue,
    // Trailing bytes of a UTF-8 sequence that was split across chunks
    pending: Vec<u8>,
    finished: bool,
}

impl HtmlTokenizer {
    pub fn new() -> Self {
        Self {
            inner: Tokenizer::new(Collector::default(), TokenizerOpts::default()),
            input: BufferQueue::new(),
            pending: Vec::new(),
            finished: false,
        }
    }

    // Feeds one chunk of bytes and returns every token completed so far
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Token> {
        if self.finished {
            return Vec::new();
        }

        self.pending.extend_from_slice(chunk);
        let text = self.decode_ready();
        if !text.is_empty() {
            self.input.push_back(StrTendril::from_slice(&text));
            let _ = self.inner.feed(&mut self.input);
        }

        self.take_tokens()
    }

    // Flushes the tokenizer. The returned tokens always end with Token::End.
    pub fn finish(&mut self) -> Vec<Token> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        if !self.pending.is_empty() {
            // Input ended in the middle of a multi-byte character
            let rest = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.input.push_back(StrTendril::from_slice(&rest));
            let _ = self.inner.feed(&mut self.input);
        }

        self.inner.end();
        self.take_tokens()
    }

    fn take_tokens(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.inner.sink.tokens)
    }

    // Decodes as much of the pending bytes as possible. Invalid sequences
    // become U+FFFD; an incomplete sequence at the end is kept for the next
    // chunk.
    fn decode_ready(&mut self) -> String {
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                        out.push_str(text);
                    }

                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }
}

impl Default for HtmlTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

// Tokenizes a complete document in one go
#[cfg(test)]
pub fn tokenize(html: &str) -> Vec<Token> {
    let mut tokenizer = HtmlTokenizer::new();
    let mut tokens = tokenizer.feed(html.as_bytes());
    tokens.extend(tokenizer.finish());
    tokens
}
