//! Paged request bodies for axum handlers

use crate::codec::SerdeJson;
use crate::config::ReaderConfig;
use crate::read::{read_paged, PagedReader, StreamSource};
use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::{header, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Extractor reading the request body lazily as a paged document
///
/// Reader settings are taken from a [`ReaderConfig`] request extension when
/// one is installed (for example with `axum::Extension`), else defaults apply.
/// A body announced as empty yields no items and default pagination.
pub struct PagedBody<T>(pub PagedReader<T>);

#[async_trait]
impl<S, T> FromRequest<S> for PagedBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send + 'static,
{
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = req.headers();
        if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !content_type.starts_with("application/json") {
                return Err((
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    format!("Expected application/json, got '{content_type}'"),
                ));
            }
        }
        let announced_empty = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");

        if announced_empty {
            debug!("Empty paged request body");
            return Ok(Self(PagedReader::empty()));
        }

        let config = req
            .extensions()
            .get::<ReaderConfig>()
            .cloned()
            .unwrap_or_default();
        let source = StreamSource::new(req.into_body().into_data_stream());
        Ok(Self(read_paged(source, Arc::new(SerdeJson), &config)))
    }
}
