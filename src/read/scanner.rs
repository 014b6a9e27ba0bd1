//! Incremental JSON tokenizer over a byte source
//!
//! The scanner never parses item values itself. It finds the extent of one
//! complete JSON value, possibly spanning many chunks, and hands its bytes
//! over for decoding. Bytes are pulled from the source only when the
//! buffered ones do not contain what was asked for.

use super::source::ByteSource;
use crate::error::{Error, Result};
use bytes::{Buf, Bytes, BytesMut};

pub(crate) struct Scanner {
    source: Box<dyn ByteSource>,
    buf: BytesMut,
    /// Absolute offset of `buf[0]` in the document
    offset: u64,
    eof: bool,
    max_value_bytes: usize,
}

impl Scanner {
    pub(crate) fn new(source: Box<dyn ByteSource>, max_value_bytes: usize) -> Self {
        Self {
            source,
            buf: BytesMut::new(),
            offset: 0,
            eof: false,
            max_value_bytes,
        }
    }

    /// Offset of the next unconsumed byte
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Pull one more non-empty chunk; false once the source is exhausted
    async fn fill(&mut self) -> Result<bool> {
        while !self.eof {
            match self.source.next_chunk().await? {
                Some(chunk) if chunk.is_empty() => {}
                Some(chunk) => {
                    self.buf.extend_from_slice(&chunk);
                    return Ok(true);
                }
                None => self.eof = true,
            }
        }
        Ok(false)
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.buf.advance(n);
        self.offset += n as u64;
    }

    /// Skip whitespace and return the next byte without consuming it
    pub(crate) async fn peek_non_ws(&mut self) -> Result<Option<u8>> {
        loop {
            let ws = self.buf.iter().take_while(|b| is_whitespace(**b)).count();
            if ws > 0 {
                self.advance(ws);
            }
            if let Some(&b) = self.buf.first() {
                return Ok(Some(b));
            }
            if !self.fill().await? {
                return Ok(None);
            }
        }
    }

    /// Consume `expected` as the next non-whitespace byte
    pub(crate) async fn expect(&mut self, expected: u8) -> Result<()> {
        match self.peek_non_ws().await? {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(b) => Err(self.unexpected(b, &format!("'{}'", char::from(expected)))),
            None => Err(self.unexpected_end()),
        }
    }

    /// Consume one complete JSON value, returning its offset and bytes
    pub(crate) async fn read_value(&mut self) -> Result<(u64, Bytes)> {
        let first = match self.peek_non_ws().await? {
            Some(b) => b,
            None => return Err(self.unexpected_end()),
        };
        let mut scan = match ValueScan::start(first) {
            Some(scan) => scan,
            None => return Err(self.unexpected(first, "a JSON value")),
        };

        loop {
            if let Some(len) = scan.advance(&self.buf) {
                if len > self.max_value_bytes {
                    return Err(self.too_large());
                }
                let at = self.offset;
                let value = self.buf.split_to(len).freeze();
                self.offset += len as u64;
                return Ok((at, value));
            }
            if scan.scanned() > self.max_value_bytes {
                return Err(self.too_large());
            }
            if !self.fill().await? {
                return Err(Error::format(
                    self.offset + self.buf.len() as u64,
                    "unexpected end of input inside a value",
                ));
            }
        }
    }

    /// Consume a property name
    pub(crate) async fn read_name(&mut self) -> Result<String> {
        match self.peek_non_ws().await? {
            Some(b'"') => {}
            Some(b) => return Err(self.unexpected(b, "a property name")),
            None => return Err(self.unexpected_end()),
        }
        let (at, value) = self.read_value().await?;
        serde_json::from_slice(&value).map_err(|e| Error::format(at, e.to_string()))
    }

    pub(crate) fn unexpected(&self, found: u8, expected: &str) -> Error {
        Error::format(
            self.offset,
            format!("expected {expected}, found '{}'", char::from(found).escape_default()),
        )
    }

    pub(crate) fn unexpected_end(&self) -> Error {
        Error::format(self.offset, "unexpected end of input")
    }

    fn too_large(&self) -> Error {
        Error::ValueTooLarge {
            offset: self.offset,
            limit: self.max_value_bytes,
        }
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_delimiter(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b',' | b']' | b'}' | b':')
}

// ============================================================================
// Value extent scanning
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Container,
    String,
    Scalar,
}

/// Resumable search for the end of one JSON value
#[derive(Debug)]
struct ValueScan {
    kind: ValueKind,
    pos: usize,
    depth: u32,
    in_string: bool,
    escaped: bool,
}

impl ValueScan {
    fn start(first: u8) -> Option<Self> {
        let kind = match first {
            b'{' | b'[' => ValueKind::Container,
            b'"' => ValueKind::String,
            b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => ValueKind::Scalar,
            _ => return None,
        };
        Some(Self {
            kind,
            pos: 0,
            depth: 0,
            in_string: false,
            escaped: false,
        })
    }

    fn scanned(&self) -> usize {
        self.pos
    }

    /// Continue over `buf` (which starts at the value); returns the value
    /// length once its end is in the buffer
    fn advance(&mut self, buf: &[u8]) -> Option<usize> {
        while self.pos < buf.len() {
            let b = buf[self.pos];
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.kind == ValueKind::String {
                        return Some(self.pos + 1);
                    }
                }
            } else {
                match self.kind {
                    ValueKind::Scalar => {
                        if is_delimiter(b) {
                            return Some(self.pos);
                        }
                    }
                    ValueKind::String | ValueKind::Container => match b {
                        b'"' => self.in_string = true,
                        b'{' | b'[' => self.depth += 1,
                        b'}' | b']' => {
                            self.depth = self.depth.saturating_sub(1);
                            if self.depth == 0 {
                                return Some(self.pos + 1);
                            }
                        }
                        _ => {}
                    },
                }
            }
            self.pos += 1;
        }
        None
    }
}
