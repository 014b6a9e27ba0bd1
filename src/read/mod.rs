//! Lazy envelope reader
//!
//! Supports: HTTP bodies, byte streams, `AsyncRead` pipes and files,
//! in-memory buffers, envelope in either property order, bare arrays
//!
//! # Overview
//!
//! [`read_paged`] wraps a [`ByteSource`] into a [`PagedReader`] without
//! touching the source. Bytes are pulled only when the first item is
//! requested or the pagination is awaited, and only as far as needed.
//!
//! Property names are matched case-insensitively and unknown properties are
//! skipped. When pagination is awaited but follows the `items` array, the
//! raw items in between are retained up to
//! [`ReaderConfig::max_buffered_items`](crate::config::ReaderConfig) so the
//! enumeration still sees every one of them.
//!
//! Malformed input surfaces when it is reached, as
//! [`Error::Format`](crate::Error::Format) carrying the byte offset.

mod reader;
mod scanner;
mod source;

pub use reader::{read_paged, read_paged_json, PagedReader};
pub use source::{ByteSource, BytesSource, ReaderSource, StreamSource};

#[cfg(test)]
mod tests;
