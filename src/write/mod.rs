//! Streaming envelope writer
//!
//! Supports: buffered `AsyncWrite` sinks, bounded chunk channels (HTTP
//! bodies), in-memory buffers, leading or trailing pagination placement
//!
//! # Overview
//!
//! [`write_paged`] writes a [`PagedEnumerable`](crate::paged::PagedEnumerable)
//! as the JSON envelope
//!
//! ```text
//! {"pagination":{"pageSize":..,"currentPage":..,"totalCount":..,"continuationToken":..},"items":[..]}
//! ```
//!
//! Items are encoded into a batch buffer that is handed to the sink whenever
//! the item-count or byte-size threshold of [`WriterConfig`](crate::config::WriterConfig)
//! is reached. The sink is flushed exactly once more at the end of the
//! document, and is never closed by the writer.

mod sink;
mod writer;

pub use sink::{ByteSink, ChannelSink, WriterSink};
pub use writer::{to_json_bytes, write_paged, WriteStats};
