//! Synthetic catalog served by `serve` and written by `generate`

use crate::codec::{CompiledPlan, PlanRegistry};
use crate::error::{Error, Result};
use crate::paged::{PagedStream, PaginationFactory};
use crate::pagination::{Pagination, PaginationStrategy};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream;
use serde::{Deserialize, Serialize};

/// 2024-01-01T00:00:00Z
const CATALOG_EPOCH: i64 = 1_704_067_200;

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleItem {
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl SampleItem {
    /// Deterministic entry for `id`
    pub fn new(id: u64) -> Self {
        let created_at =
            DateTime::from_timestamp(CATALOG_EPOCH + (id as i64) * 60, 0).unwrap_or_default();
        Self {
            id,
            name: format!("item-{id:05}"),
            created_at,
        }
    }
}

// ============================================================================
// Compiled plan
// ============================================================================

fn encode_sample(item: &SampleItem, out: &mut Vec<u8>) -> Result<()> {
    out.extend_from_slice(b"{\"id\":");
    out.extend_from_slice(item.id.to_string().as_bytes());
    out.extend_from_slice(b",\"name\":");
    serde_json::to_writer(&mut *out, &item.name)?;
    out.extend_from_slice(b",\"createdAt\":\"");
    out.extend_from_slice(
        item.created_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .as_bytes(),
    );
    out.extend_from_slice(b"\"}");
    Ok(())
}

fn decode_sample(bytes: &[u8]) -> Result<SampleItem> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Registry holding the compiled plan for [`SampleItem`]
pub fn sample_registry() -> PlanRegistry {
    PlanRegistry::builder()
        .register(CompiledPlan::new("sample-item", encode_sample, decode_sample))
        .build()
}

// ============================================================================
// Catalog pages
// ============================================================================

/// Opaque token pointing at the first item of the next page
pub fn encode_continuation(offset: u64) -> String {
    URL_SAFE_NO_PAD.encode(format!("offset:{offset}"))
}

/// Offset carried by a continuation token
pub fn decode_continuation(token: &str) -> Result<u64> {
    let invalid = || Error::invalid_pagination(format!("Invalid continuation token '{token}'"));
    let raw = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
    let raw = String::from_utf8(raw).map_err(|_| invalid())?;
    raw.strip_prefix("offset:")
        .and_then(|offset| offset.parse().ok())
        .ok_or_else(invalid)
}

/// Items `[offset, offset + page_size)` of a catalog of `total` items, with
/// fixed pagination and a continuation token when more items follow
pub fn catalog_page(total: u64, page_size: u32, offset: u64) -> PagedStream<SampleItem> {
    let start = offset.min(total);
    let end = start.saturating_add(u64::from(page_size)).min(total);
    let current_page = if page_size == 0 {
        1
    } else {
        (start / u64::from(page_size)) as u32 + 1
    };

    let mut pagination = Pagination::new(page_size, current_page, Some(total));
    if end < total {
        pagination = pagination.with_continuation_token(encode_continuation(end));
    }

    PagedStream::from_fn(
        move |_| stream::iter((start..end).map(|id| Ok(SampleItem::new(id)))),
        pagination,
    )
}

/// The whole catalog, with pagination derived from the items streamed so far
pub fn catalog_stream(
    total: u64,
    page_size: u32,
    strategy: PaginationStrategy,
) -> PagedStream<SampleItem> {
    PagedStream::from_fn(
        move |_| stream::iter((0..total).map(|id| Ok(SampleItem::new(id)))),
        PaginationFactory::counting(page_size),
    )
    .with_strategy(strategy)
}
