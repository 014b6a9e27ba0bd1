//! Paged stream module
//!
//! Supports: single-shot and restartable sources, fixed / deferred /
//! progress-derived pagination, sync and async item mapping
//!
//! # Overview
//!
//! A paged stream is an async sequence of items paired with pagination that
//! may only be known once enumeration has progressed. [`PagedEnumerable`] is
//! the contract shared by producers ([`PagedStream`]) and by the lazy
//! deserializer ([`PagedReader`](crate::read::PagedReader)).
//!
//! `resolve_pagination` never enumerates items itself. Producers whose
//! pagination depends on the full count either enumerate first, or are
//! written with trailing pagination placement (see
//! [`WriterConfig`](crate::config::WriterConfig)).

mod adapters;
mod factory;
mod source;
mod stream;

pub use adapters::Cancellable;
pub use factory::{DeferredFn, PaginationFactory, ProgressFn};
pub use stream::{Page, PagedEnumerable, PagedEnumerableExt, PagedStream};

#[cfg(test)]
mod tests;
