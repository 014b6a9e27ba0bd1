//! Streaming paged responses for axum handlers

use super::body::spawn_envelope;
use super::CONTENT_TYPE_JSON;
use crate::codec::{ItemEncoder, SerdeJson};
use crate::config::WriterConfig;
use crate::paged::PagedEnumerable;
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A paged result returned from a handler
///
/// The envelope is written by a background task while the body is being
/// sent; nothing is collected in memory up front.
///
/// # Example
///
/// ```ignore
/// async fn list() -> PagedJson<Item> {
///     PagedJson::new(PagedStream::from_vec(items, Pagination::new(10, 1, Some(42))))
/// }
/// ```
pub struct PagedJson<T> {
    paged: Arc<dyn PagedEnumerable<T>>,
    encoder: Arc<dyn ItemEncoder<T>>,
    config: WriterConfig,
    channel_capacity: usize,
    cancel: CancellationToken,
    status: StatusCode,
}

impl<T: Serialize + Send + 'static> PagedJson<T> {
    /// Respond with `paged`, encoding items through serde
    pub fn new(paged: impl PagedEnumerable<T> + 'static) -> Self {
        Self::from_arc(Arc::new(paged), Arc::new(SerdeJson))
    }
}

impl<T: Send + 'static> PagedJson<T> {
    /// Respond with a shared paged enumerable and an explicit encoder
    pub fn from_arc(paged: Arc<dyn PagedEnumerable<T>>, encoder: Arc<dyn ItemEncoder<T>>) -> Self {
        Self {
            paged,
            encoder,
            config: WriterConfig::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            cancel: CancellationToken::new(),
            status: StatusCode::OK,
        }
    }

    /// Use a specific item encoder, such as a registered compiled plan
    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn ItemEncoder<T>>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Set the writer settings
    #[must_use]
    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how many chunks may wait for the client
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Stop writing when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set the response status
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Send + 'static> IntoResponse for PagedJson<T> {
    fn into_response(self) -> Response {
        let rx = spawn_envelope(
            self.paged,
            self.encoder,
            self.config,
            self.channel_capacity,
            self.cancel,
        );
        (
            self.status,
            [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)],
            Body::from_stream(rx),
        )
            .into_response()
    }
}
