//! Envelope writer task feeding a streaming body

use crate::codec::ItemEncoder;
use crate::config::WriterConfig;
use crate::error::Error;
use crate::paged::PagedEnumerable;
use crate::write::{write_paged, ChannelSink};
use bytes::Bytes;
use futures::channel::mpsc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Spawn a task writing `paged` into a bounded channel and return the
/// receiving half, ready to become a response or request body
///
/// The task stops when the body is dropped. Failures after the first chunk
/// end the body with an error so the peer sees a broken transfer instead of
/// a silently truncated document.
pub(crate) fn spawn_envelope<T: Send + 'static>(
    paged: Arc<dyn PagedEnumerable<T>>,
    encoder: Arc<dyn ItemEncoder<T>>,
    config: WriterConfig,
    capacity: usize,
    cancel: CancellationToken,
) -> mpsc::Receiver<std::io::Result<Bytes>> {
    let (mut sink, rx) = ChannelSink::channel(capacity.max(1));
    tokio::spawn(async move {
        match write_paged(paged.as_ref(), &mut sink, encoder.as_ref(), &config, &cancel).await {
            Ok(stats) => debug!("Streamed {} items in {} bytes", stats.items, stats.bytes),
            Err(Error::SinkClosed) => debug!("Peer went away before the document was complete"),
            Err(e) => sink.abort(&e).await,
        }
    });
    rx
}
