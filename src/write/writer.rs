//! Envelope serialization with adaptive batching

use super::sink::ByteSink;
use crate::codec::ItemEncoder;
use crate::config::{PaginationPlacement, WriterConfig};
use crate::error::{Error, Result};
use crate::paged::PagedEnumerable;
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const OPEN_ENVELOPE: &[u8] = b"{";
const PAGINATION_PROPERTY: &[u8] = b"\"pagination\":";
const ITEMS_PROPERTY: &[u8] = b"\"items\":[";

/// Counters reported after a document was written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Items encoded
    pub items: u64,
    /// Bytes handed to the sink
    pub bytes: u64,
    /// Sink flushes, including the final one
    pub flushes: u64,
}

/// Write a paged enumerable to `sink` as one JSON envelope
///
/// Pagination is written before the items unless the config asks for
/// trailing placement. On failure the batches already flushed stay in the
/// sink and the document is left truncated.
pub async fn write_paged<T, P, S>(
    paged: &P,
    sink: &mut S,
    encoder: &dyn ItemEncoder<T>,
    config: &WriterConfig,
    cancel: &CancellationToken,
) -> Result<WriteStats>
where
    T: Send + 'static,
    P: PagedEnumerable<T> + ?Sized,
    S: ByteSink + ?Sized,
{
    let mut batch = Batch::new(sink, config);
    match write_document(paged, &mut batch, encoder, config, cancel).await {
        Ok(()) => {
            debug!(
                "Wrote {} items in {} bytes with {} flushes ({} encoder)",
                batch.stats.items,
                batch.stats.bytes,
                batch.stats.flushes,
                encoder.name()
            );
            Ok(batch.stats)
        }
        Err(e) => {
            if !e.is_cancelled() {
                warn!(
                    "Envelope truncated after {} items and {} bytes: {}",
                    batch.stats.items, batch.stats.bytes, e
                );
            }
            Err(e)
        }
    }
}

/// Serialize a paged enumerable into one contiguous buffer
pub async fn to_json_bytes<T, P>(
    paged: &P,
    encoder: &dyn ItemEncoder<T>,
    config: &WriterConfig,
    cancel: &CancellationToken,
) -> Result<Bytes>
where
    T: Send + 'static,
    P: PagedEnumerable<T> + ?Sized,
{
    let mut out = Vec::with_capacity(config.initial_buffer_capacity);
    write_paged(paged, &mut out, encoder, config, cancel).await?;
    Ok(Bytes::from(out))
}

async fn write_document<T, P, S>(
    paged: &P,
    batch: &mut Batch<'_, S>,
    encoder: &dyn ItemEncoder<T>,
    config: &WriterConfig,
    cancel: &CancellationToken,
) -> Result<()>
where
    T: Send + 'static,
    P: PagedEnumerable<T> + ?Sized,
    S: ByteSink + ?Sized,
{
    batch.buf.extend_from_slice(OPEN_ENVELOPE);

    if config.pagination_placement == PaginationPlacement::Leading {
        write_pagination(paged, batch, cancel).await?;
        batch.buf.push(b',');
    }

    batch.buf.extend_from_slice(ITEMS_PROPERTY);
    let mut items = paged.items(cancel.clone());
    let mut first = true;
    while let Some(item) = items.next().await {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let item = item?;
        if !first {
            batch.buf.push(b',');
        }
        first = false;
        encoder.encode(&item, &mut batch.buf)?;
        batch.pending_items += 1;
        batch.stats.items += 1;

        if batch.threshold_reached() {
            batch.flush().await?;
        }
    }
    batch.buf.push(b']');

    if config.pagination_placement == PaginationPlacement::Trailing {
        batch.buf.push(b',');
        write_pagination(paged, batch, cancel).await?;
    }

    batch.buf.push(b'}');
    batch.flush().await
}

async fn write_pagination<T, P, S>(
    paged: &P,
    batch: &mut Batch<'_, S>,
    cancel: &CancellationToken,
) -> Result<()>
where
    P: PagedEnumerable<T> + ?Sized,
    S: ByteSink + ?Sized,
{
    let pagination = paged.resolve_pagination(cancel).await?;
    batch.buf.extend_from_slice(PAGINATION_PROPERTY);
    serde_json::to_writer(&mut batch.buf, &pagination)?;
    Ok(())
}

// ============================================================================
// Batch buffer
// ============================================================================

struct Batch<'a, S: ?Sized> {
    sink: &'a mut S,
    buf: Vec<u8>,
    pending_items: usize,
    item_threshold: usize,
    byte_threshold: usize,
    capacity: usize,
    stats: WriteStats,
}

impl<'a, S: ByteSink + ?Sized> Batch<'a, S> {
    fn new(sink: &'a mut S, config: &WriterConfig) -> Self {
        Self {
            sink,
            buf: Vec::with_capacity(config.initial_buffer_capacity),
            pending_items: 0,
            item_threshold: config.item_threshold.max(1),
            byte_threshold: config.byte_threshold.max(1),
            capacity: config.initial_buffer_capacity,
            stats: WriteStats::default(),
        }
    }

    fn threshold_reached(&self) -> bool {
        self.pending_items >= self.item_threshold || self.buf.len() >= self.byte_threshold
    }

    /// Hand the buffered bytes to the sink and flush it
    async fn flush(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(self.capacity));
            let len = chunk.len();
            self.sink.write(Bytes::from(chunk)).await?;
            self.stats.bytes += len as u64;
        }
        self.sink.flush().await?;
        self.stats.flushes += 1;
        debug!(
            "Flushed batch of {} items, {} bytes written so far",
            self.pending_items, self.stats.bytes
        );
        self.pending_items = 0;
        Ok(())
    }
}
