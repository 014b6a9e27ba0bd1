//! Envelope state machine and the paged reader built on it

use super::scanner::Scanner;
use super::source::{ByteSource, BytesSource};
use crate::codec::{ItemDecoder, SerdeJson};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::paged::{Cancellable, PagedEnumerable};
use crate::pagination::Pagination;
use crate::types::ItemStream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::RwLock;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Top-level property of the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    Pagination,
    Items,
    Unknown,
}

impl Property {
    fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("pagination") {
            Self::Pagination
        } else if name.eq_ignore_ascii_case("items") {
            Self::Items
        } else {
            Self::Unknown
        }
    }
}

/// Position in the document
///
/// Every transition consumes at most one token, so a step abandoned by
/// cancellation never loses input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    /// Inside the envelope object, before a member or the closing brace
    Member { first: bool },
    Name,
    Colon(Property),
    Value(Property),
    /// Inside an array; `root` when the document itself is the array
    Array { root: bool, first: bool },
    /// After a comma inside an array
    Element { root: bool },
    /// After the root value closed
    Trailer,
    Done,
    Failed,
}

enum Step {
    Item(u64, Bytes),
    Progress,
    End,
}

// ============================================================================
// EnvelopeReader
// ============================================================================

/// Forward-only parser over one paged document
pub(crate) struct EnvelopeReader {
    scanner: Scanner,
    state: State,
    /// Raw items read while seeking the pagination
    pending: VecDeque<(u64, Bytes)>,
    max_buffered_items: usize,
    seen_items: bool,
    seen_pagination: bool,
    pagination: Arc<RwLock<Option<Pagination>>>,
}

impl EnvelopeReader {
    fn new(
        source: Box<dyn ByteSource>,
        config: &ReaderConfig,
        pagination: Arc<RwLock<Option<Pagination>>>,
    ) -> Self {
        Self {
            scanner: Scanner::new(source, config.max_value_bytes),
            state: State::Start,
            pending: VecDeque::new(),
            max_buffered_items: config.max_buffered_items,
            seen_items: false,
            seen_pagination: false,
            pagination,
        }
    }

    fn finished(pagination: Arc<RwLock<Option<Pagination>>>) -> Self {
        let mut reader = Self::new(
            Box::new(BytesSource::empty()),
            &ReaderConfig::default(),
            pagination,
        );
        reader.state = State::Done;
        reader
    }

    /// Next raw item with its offset, `None` once the items are exhausted
    async fn next_item(&mut self) -> Result<Option<(u64, Bytes)>> {
        if let Some(item) = self.pending.pop_front() {
            return Ok(Some(item));
        }
        loop {
            match self.step().await? {
                Step::Item(offset, bytes) => return Ok(Some((offset, bytes))),
                Step::Progress => {}
                Step::End => return Ok(None),
            }
        }
    }

    /// Read until the pagination is known or the document ends
    async fn resolve_pagination(&mut self) -> Result<Pagination> {
        while !self.seen_pagination {
            match self.step().await? {
                Step::Item(offset, bytes) => {
                    self.pending.push_back((offset, bytes));
                    if self.pending.len() > self.max_buffered_items {
                        return Err(Error::PaginationBufferExceeded {
                            limit: self.max_buffered_items,
                        });
                    }
                }
                Step::Progress => {}
                Step::End => break,
            }
        }
        Ok(self.pagination.read().clone().unwrap_or_default())
    }

    async fn step(&mut self) -> Result<Step> {
        let result = self.advance_state().await;
        if let Err(e) = &result {
            if !matches!(e, Error::PaginationBufferExceeded { .. }) {
                warn!("Paged document rejected: {}", e);
                self.state = State::Failed;
            }
        }
        result
    }

    async fn advance_state(&mut self) -> Result<Step> {
        match self.state {
            State::Start => match self.scanner.peek_non_ws().await? {
                Some(b'{') => {
                    self.scanner.advance(1);
                    self.state = State::Member { first: true };
                }
                Some(b'[') => {
                    self.scanner.advance(1);
                    debug!("Reading bare array document");
                    *self.pagination.write() = Some(Pagination::default());
                    self.seen_pagination = true;
                    self.state = State::Array {
                        root: true,
                        first: true,
                    };
                }
                Some(b) => return Err(self.scanner.unexpected(b, "an object or an array")),
                None => return Err(Error::format(self.scanner.offset(), "document is empty")),
            },

            State::Member { first } => match self.scanner.peek_non_ws().await? {
                Some(b'}') => {
                    self.scanner.advance(1);
                    self.state = State::Trailer;
                }
                Some(b',') if !first => {
                    self.scanner.advance(1);
                    self.state = State::Name;
                }
                Some(b'"') if first => self.state = State::Name,
                Some(b) => {
                    let expected = if first { "a property name or '}'" } else { "',' or '}'" };
                    return Err(self.scanner.unexpected(b, expected));
                }
                None => return Err(self.scanner.unexpected_end()),
            },

            State::Name => {
                let at = self.scanner.offset();
                let name = self.scanner.read_name().await?;
                let property = Property::from_name(&name);
                match property {
                    Property::Items if self.seen_items => {
                        return Err(Error::format(at, "duplicate items property"));
                    }
                    Property::Pagination if self.seen_pagination => {
                        return Err(Error::format(at, "duplicate pagination property"));
                    }
                    Property::Items => self.seen_items = true,
                    Property::Pagination | Property::Unknown => {}
                }
                self.state = State::Colon(property);
            }

            State::Colon(property) => {
                self.scanner.expect(b':').await?;
                self.state = State::Value(property);
            }

            State::Value(Property::Items) => match self.scanner.peek_non_ws().await? {
                Some(b'[') => {
                    self.scanner.advance(1);
                    self.state = State::Array {
                        root: false,
                        first: true,
                    };
                }
                Some(b'n') => {
                    let (at, value) = self.scanner.read_value().await?;
                    if &value[..] != b"null" {
                        return Err(Error::format(at, "items must be an array"));
                    }
                    self.state = State::Member { first: false };
                }
                Some(b) => return Err(self.scanner.unexpected(b, "an items array")),
                None => return Err(self.scanner.unexpected_end()),
            },

            State::Value(Property::Pagination) => {
                let (at, value) = self.scanner.read_value().await?;
                let pagination: Option<Pagination> = serde_json::from_slice(&value)
                    .map_err(|e| Error::format(at, format!("invalid pagination: {e}")))?;
                let pagination = pagination.unwrap_or_default();
                debug!(
                    "Pagination found at byte {}: page {} of size {}",
                    at, pagination.current_page, pagination.page_size
                );
                *self.pagination.write() = Some(pagination);
                self.seen_pagination = true;
                self.state = State::Member { first: false };
            }

            State::Value(Property::Unknown) => {
                let (at, value) = self.scanner.read_value().await?;
                serde_json::from_slice::<IgnoredAny>(&value)
                    .map_err(|e| Error::format(at, e.to_string()))?;
                self.state = State::Member { first: false };
            }

            State::Array { root, first } => match self.scanner.peek_non_ws().await? {
                Some(b']') => {
                    self.scanner.advance(1);
                    self.state = if root {
                        State::Trailer
                    } else {
                        State::Member { first: false }
                    };
                }
                Some(b',') if !first => {
                    self.scanner.advance(1);
                    self.state = State::Element { root };
                }
                Some(b) if !first => return Err(self.scanner.unexpected(b, "',' or ']'")),
                Some(_) => {
                    let (at, value) = self.scanner.read_value().await?;
                    self.state = State::Array { root, first: false };
                    return Ok(Step::Item(at, value));
                }
                None => return Err(self.scanner.unexpected_end()),
            },

            State::Element { root } => {
                let (at, value) = self.scanner.read_value().await?;
                self.state = State::Array { root, first: false };
                return Ok(Step::Item(at, value));
            }

            State::Trailer => match self.scanner.peek_non_ws().await? {
                None => {
                    debug!("Paged document complete at byte {}", self.scanner.offset());
                    self.state = State::Done;
                }
                Some(b) => return Err(self.scanner.unexpected(b, "end of document")),
            },

            State::Done => return Ok(Step::End),

            State::Failed => {
                return Err(Error::format(
                    self.scanner.offset(),
                    "reader stopped after an earlier error",
                ))
            }
        }
        Ok(Step::Progress)
    }
}

// ============================================================================
// PagedReader
// ============================================================================

/// Lazily parsed paged document
///
/// Items can be enumerated once; pagination can be resolved any number of
/// times, before, during or after the enumeration.
pub struct PagedReader<T> {
    reader: Arc<Mutex<EnvelopeReader>>,
    pagination: Arc<RwLock<Option<Pagination>>>,
    decoder: Arc<dyn ItemDecoder<T>>,
    enumerated: AtomicBool,
}

impl<T> std::fmt::Debug for PagedReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedReader")
            .field("pagination", &*self.pagination.read())
            .field("enumerated", &self.enumerated.load(Ordering::SeqCst))
            .finish()
    }
}

/// Wrap a byte source; nothing is read until items or pagination are requested
pub fn read_paged<T, S>(
    source: S,
    decoder: Arc<dyn ItemDecoder<T>>,
    config: &ReaderConfig,
) -> PagedReader<T>
where
    T: Send + 'static,
    S: ByteSource + 'static,
{
    let pagination = Arc::new(RwLock::new(None));
    let reader = EnvelopeReader::new(Box::new(source), config, Arc::clone(&pagination));
    PagedReader::from_parts(reader, pagination, decoder)
}

/// [`read_paged`] with the serde decoder
pub fn read_paged_json<T, S>(source: S, config: &ReaderConfig) -> PagedReader<T>
where
    T: DeserializeOwned + Send + 'static,
    S: ByteSource + 'static,
{
    read_paged(source, Arc::new(SerdeJson), config)
}

impl<T: Send + 'static> PagedReader<T> {
    fn from_parts(
        reader: EnvelopeReader,
        pagination: Arc<RwLock<Option<Pagination>>>,
        decoder: Arc<dyn ItemDecoder<T>>,
    ) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
            pagination,
            decoder,
            enumerated: AtomicBool::new(false),
        }
    }

    /// A reader for an explicit "no content" response: no items and
    /// default pagination
    pub fn empty() -> Self
    where
        T: DeserializeOwned,
    {
        Self::empty_with(Arc::new(SerdeJson))
    }

    /// [`PagedReader::empty`] for a reader configured with its own decoder
    pub fn empty_with(decoder: Arc<dyn ItemDecoder<T>>) -> Self {
        let pagination = Arc::new(RwLock::new(None));
        let reader = EnvelopeReader::finished(Arc::clone(&pagination));
        Self::from_parts(reader, pagination, decoder)
    }

    /// Whether the items were already handed out
    pub fn is_enumerated(&self) -> bool {
        self.enumerated.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Send + 'static> PagedEnumerable<T> for PagedReader<T> {
    fn pagination(&self) -> Pagination {
        self.pagination.read().clone().unwrap_or_default()
    }

    async fn resolve_pagination(&self, cancel: &CancellationToken) -> Result<Pagination> {
        let known = self.pagination.read().clone();
        if let Some(pagination) = known {
            return Ok(pagination);
        }
        let reader = Arc::clone(&self.reader);
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = async move { reader.lock().await.resolve_pagination().await } => result,
        }
    }

    fn items(&self, cancel: CancellationToken) -> ItemStream<T> {
        if self.enumerated.swap(true, Ordering::SeqCst) {
            return Box::pin(stream::once(async { Err(Error::SourceConsumed) }));
        }
        let state = (Arc::clone(&self.reader), Arc::clone(&self.decoder), false);
        let items = stream::unfold(state, |(reader, decoder, failed)| async move {
            if failed {
                return None;
            }
            let next = reader.lock().await.next_item().await;
            match next {
                Ok(Some((offset, bytes))) => {
                    let item = decode_at(decoder.as_ref(), offset, &bytes);
                    let failed = item.is_err();
                    Some((item, (reader, decoder, failed)))
                }
                Ok(None) => None,
                Err(e) => Some((Err(e), (reader, decoder, true))),
            }
        });
        Box::pin(Cancellable::new(items, cancel))
    }
}

/// Decode one item, reporting malformed JSON at the item's offset
fn decode_at<T>(decoder: &dyn ItemDecoder<T>, offset: u64, bytes: &[u8]) -> Result<T> {
    decoder.decode(bytes).map_err(|e| match e {
        Error::JsonParse(inner) if inner.is_syntax() || inner.is_eof() => {
            Error::format(offset, inner.to_string())
        }
        other => other,
    })
}
