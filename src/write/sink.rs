//! Byte sinks the envelope writer can target

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::SinkExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Destination for the serialized envelope
///
/// The writer hands over whole batches and calls `flush` once per batch.
/// It never closes the sink.
#[async_trait]
pub trait ByteSink: Send {
    /// Accept one chunk of the document
    async fn write(&mut self, chunk: Bytes) -> Result<()>;

    /// Push accepted chunks towards the consumer
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ByteSink for Vec<u8> {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        self.extend_from_slice(&chunk);
        Ok(())
    }
}

// ============================================================================
// AsyncWrite
// ============================================================================

/// Sink over any tokio `AsyncWrite` (files, stdout, pipes, sockets)
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin + Send> WriterSink<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Get a reference to the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ByteSink for WriterSink<W> {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        self.inner.write_all(&chunk).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await?;
        Ok(())
    }
}

// ============================================================================
// Channel
// ============================================================================

/// Sink feeding a bounded channel, typically drained by a streaming HTTP body
///
/// Sending waits while the channel is full, so a slow consumer throttles the
/// writer. A dropped receiver surfaces as [`Error::SinkClosed`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<std::io::Result<Bytes>>,
}

impl ChannelSink {
    /// Create a sink and the receiving half of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<std::io::Result<Bytes>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Forward an error to the consumer, ending its stream abnormally
    pub async fn abort(&mut self, error: &Error) {
        let error = std::io::Error::new(std::io::ErrorKind::Other, error.to_string());
        // The consumer may already be gone
        let _ = self.tx.send(Err(error)).await;
    }
}

#[async_trait]
impl ByteSink for ChannelSink {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        self.tx.send(Ok(chunk)).await.map_err(|_| Error::SinkClosed)
    }
}
