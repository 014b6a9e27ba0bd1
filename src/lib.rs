// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pagewise
//!
//! Paged async streams and their JSON envelope protocol.
//!
//! ## Features
//!
//! - **Paged Streams**: async item sequences with pagination that may only be
//!   known once enumeration has progressed
//! - **Refresh Strategies**: none, per page or per item
//! - **Streaming Writer**: the `{"pagination":..,"items":[..]}` envelope with
//!   adaptive batching by item count and byte size
//! - **Lazy Reader**: forward-only parsing from HTTP bodies, pipes or streams,
//!   accepting either property order or a bare array
//! - **HTTP Glue**: axum responses and extractors, reqwest responses
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagewise::{read_paged_json, to_json_bytes, BytesSource, PagedEnumerable, PagedStream,
//!     Pagination, ReaderConfig, SerdeJson, WriterConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let paged = PagedStream::from_vec(vec![1, 2], Pagination::new(2, 1, Some(2)));
//! let bytes = to_json_bytes(&paged, &SerdeJson, &WriterConfig::default(), &cancel).await?;
//!
//! let reader = read_paged_json::<u32, _>(BytesSource::new(bytes), &ReaderConfig::default());
//! let pagination = reader.resolve_pagination(&cancel).await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   write_paged    ┌──────────┐   read_paged   ┌──────────────┐
//! │ PagedStream  │ ───────────────▶ │ ByteSink │ ─ ─ bytes ─ ─▶ │ PagedReader  │
//! │ (items +     │  ItemEncoder     │ (file,   │   ByteSource   │ (lazy items, │
//! │  pagination) │  batching        │  channel)│   ItemDecoder  │  pagination) │
//! └──────────────┘                  └──────────┘                └──────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pagination metadata and refresh strategies
pub mod pagination;

/// Paged enumerable contract and producers
pub mod paged;

/// Item serialization plans
pub mod codec;

/// Configuration
pub mod config;

/// Streaming envelope writer
pub mod write;

/// Lazy envelope reader
pub mod read;

/// HTTP transport glue
pub mod http;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use codec::{CompiledPlan, ItemDecoder, ItemEncoder, PlanRegistry, SerdeJson};
pub use config::{AppConfig, PaginationPlacement, ReaderConfig, WriterConfig};
pub use paged::{Page, PagedEnumerable, PagedEnumerableExt, PagedStream, PaginationFactory};
pub use pagination::{Pagination, PaginationStrategy};
pub use read::{read_paged, read_paged_json, ByteSource, BytesSource, PagedReader};
pub use write::{to_json_bytes, write_paged, ByteSink, WriteStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
