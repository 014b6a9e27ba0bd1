//! Reading paged documents over reqwest
//!
//! Provides:
//! - Conversion of a `reqwest::Response` into a lazy [`PagedReader`]
//! - A small client that fetches and posts paged documents

use super::body::spawn_envelope;
use super::CONTENT_TYPE_JSON;
use crate::codec::{ItemDecoder, ItemEncoder, SerdeJson};
use crate::config::{ReaderConfig, WriterConfig};
use crate::error::{Error, Result};
use crate::paged::PagedEnumerable;
use crate::read::{read_paged, PagedReader, StreamSource};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Turn a response into a lazy paged reader using serde for items
///
/// Non-success statuses become [`Error::HttpStatus`]; `204 No Content` and
/// an announced empty body yield an empty reader.
pub async fn read_paged_response<T>(response: Response, config: &ReaderConfig) -> Result<PagedReader<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    read_paged_response_with(response, Arc::new(SerdeJson), config).await
}

/// [`read_paged_response`] with an explicit item decoder
pub async fn read_paged_response_with<T>(
    response: Response,
    decoder: Arc<dyn ItemDecoder<T>>,
    config: &ReaderConfig,
) -> Result<PagedReader<T>>
where
    T: Send + 'static,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("Paged request failed with HTTP {}", status);
        return Err(Error::http_status(status.as_u16(), body));
    }

    if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
        debug!("Response has no content, using an empty reader");
        return Ok(PagedReader::empty_with(decoder));
    }

    Ok(read_paged(
        StreamSource::new(response.bytes_stream()),
        decoder,
        config,
    ))
}

/// GET `url` and read the response as a paged document
pub async fn fetch_paged<T>(client: &Client, url: &str, config: &ReaderConfig) -> Result<PagedReader<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let url = Url::parse(url)?;
    debug!("GET {}", url);
    let response = client
        .get(url)
        .header(ACCEPT, CONTENT_TYPE_JSON)
        .send()
        .await?;
    read_paged_response(response, config).await
}

// ============================================================================
// PagedClient
// ============================================================================

/// Client for services speaking the paged envelope
#[derive(Debug, Clone)]
pub struct PagedClient {
    client: Client,
    base_url: Url,
    reader: ReaderConfig,
    writer: WriterConfig,
    channel_capacity: usize,
}

impl PagedClient {
    /// Create a client for `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("pagewise/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            reader: ReaderConfig::default(),
            writer: WriterConfig::default(),
            channel_capacity: 16,
        })
    }

    /// Set the reader settings
    #[must_use]
    pub fn with_reader_config(mut self, config: ReaderConfig) -> Self {
        self.reader = config;
        self
    }

    /// Set the writer settings used for request bodies
    #[must_use]
    pub fn with_writer_config(mut self, config: WriterConfig) -> Self {
        self.writer = config;
        self
    }

    /// Base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// GET a paged document
    pub async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<PagedReader<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .header(ACCEPT, CONTENT_TYPE_JSON)
            .send()
            .await?;
        read_paged_response(response, &self.reader).await
    }

    /// POST a paged enumerable as the request body and read the paged response
    pub async fn post<T, U>(
        &self,
        path: &str,
        paged: Arc<dyn PagedEnumerable<T>>,
        encoder: Arc<dyn ItemEncoder<T>>,
        cancel: &CancellationToken,
    ) -> Result<PagedReader<U>>
    where
        T: Send + 'static,
        U: DeserializeOwned + Send + 'static,
    {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let body = spawn_envelope(
            paged,
            encoder,
            self.writer.clone(),
            self.channel_capacity,
            cancel.clone(),
        );
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(ACCEPT, CONTENT_TYPE_JSON)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;
        read_paged_response(response, &self.reader).await
    }
}
