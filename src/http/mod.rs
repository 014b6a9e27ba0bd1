//! HTTP transport glue
//!
//! Supports: axum responses and extractors, reqwest responses and request
//! bodies
//!
//! # Overview
//!
//! - [`PagedJson`] streams a paged enumerable as an axum response body
//! - [`PagedBody`] turns an axum request body into a lazy [`PagedReader`](crate::read::PagedReader)
//! - [`read_paged_response`] and [`PagedClient`] do the same on the client side
//!
//! Bodies flow through a bounded channel between the envelope writer task
//! and the transport, so memory stays bounded by the channel capacity and
//! the writer's batch thresholds.

mod body;
mod client;
mod request;
mod response;

pub use client::{fetch_paged, read_paged_response, read_paged_response_with, PagedClient};
pub use request::PagedBody;
pub use response::PagedJson;

/// Content type of paged documents
pub const CONTENT_TYPE_JSON: &str = "application/json";
