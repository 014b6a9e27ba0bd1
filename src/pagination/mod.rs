//! Pagination module
//!
//! Supports: fixed metadata, per-page refresh, per-item refresh
//!
//! # Overview
//!
//! The pagination module provides the [`Pagination`] value carried by every
//! paged stream, and the strategies that decide how often a progress-derived
//! value is recomputed while items are being enumerated.

mod strategy;
mod types;

pub use strategy::{PaginationStrategy, PaginationTracker, Progress};
pub use types::Pagination;
