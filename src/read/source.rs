//! Byte sources the envelope reader can pull from

use crate::error::{Error, Result};
use crate::types::ByteStream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Forward-only supply of document bytes
#[async_trait]
pub trait ByteSource: Send {
    /// Next chunk, or `None` once the source is exhausted
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

// ============================================================================
// Streams
// ============================================================================

/// Source over any fallible stream of byte chunks
///
/// Covers `reqwest::Response::bytes_stream` and
/// `axum::body::Body::into_data_stream`.
pub struct StreamSource {
    inner: ByteStream,
}

impl StreamSource {
    /// Wrap a chunk stream
    pub fn new<S, E>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<Error>,
    {
        Self {
            inner: Box::pin(stream.map(|chunk| chunk.map_err(Into::into))),
        }
    }
}

#[async_trait]
impl ByteSource for StreamSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.inner.next().await.transpose()
    }
}

// ============================================================================
// AsyncRead
// ============================================================================

/// Source over a tokio `AsyncRead` (files, stdin, sockets, duplex pipes)
pub struct ReaderSource<R> {
    inner: ReaderStream<R>,
}

impl<R: AsyncRead + Unpin + Send> ReaderSource<R> {
    /// Wrap a reader, reading up to `capacity` bytes at a time
    pub fn new(reader: R, capacity: usize) -> Self {
        Self {
            inner: ReaderStream::with_capacity(reader, capacity.max(1)),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ByteSource for ReaderSource<R> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.inner.next().await.transpose()?)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Source over a buffer already held in memory
#[derive(Debug, Clone, Default)]
pub struct BytesSource {
    data: Option<Bytes>,
}

impl BytesSource {
    /// Wrap a complete document
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    /// A source without any bytes
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ByteSource for BytesSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.data.take())
    }
}

#[async_trait]
impl ByteSource for Box<dyn ByteSource> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        (**self).next_chunk().await
    }
}
