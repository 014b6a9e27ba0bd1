//! Pagination metadata value
//!
//! The metadata that travels next to every paged stream and is written as the
//! `pagination` object of the wire envelope.

use crate::error::{Error, Result};
use crate::types::OptionStringExt;
use serde::{Deserialize, Serialize};

/// Immutable pagination metadata for a page of results
///
/// `page_size == 0` means unbounded or unknown, `current_page == 0` means the
/// page is not known yet. When both are zero the value represents "no
/// pagination computed yet", which is also the [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Items requested per page
    #[serde(default, alias = "PageSize")]
    pub page_size: u32,

    /// 1-based index of the current page
    #[serde(default, alias = "CurrentPage")]
    pub current_page: u32,

    /// Total items across all pages, when the source can count them
    #[serde(default, alias = "TotalCount")]
    pub total_count: Option<u64>,

    /// Opaque cursor for the next fetch
    #[serde(default, alias = "ContinuationToken")]
    pub continuation_token: Option<String>,
}

impl Pagination {
    /// Create pagination metadata
    pub fn new(page_size: u32, current_page: u32, total_count: Option<u64>) -> Self {
        Self {
            page_size,
            current_page,
            total_count,
            continuation_token: None,
        }
    }

    /// The "no pagination computed yet" value
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create pagination metadata from signed values (e.g. query strings),
    /// rejecting negative arguments
    pub fn checked(page_size: i64, current_page: i64, total_count: Option<i64>) -> Result<Self> {
        let page_size = u32::try_from(page_size).map_err(|_| {
            Error::invalid_pagination(format!(
                "page size must be between 0 and {}, got {page_size}",
                u32::MAX
            ))
        })?;
        let current_page = u32::try_from(current_page).map_err(|_| {
            Error::invalid_pagination(format!(
                "current page must be between 0 and {}, got {current_page}",
                u32::MAX
            ))
        })?;
        let total_count = total_count
            .map(|total| {
                u64::try_from(total).map_err(|_| {
                    Error::invalid_pagination(format!(
                        "total count must not be negative, got {total}"
                    ))
                })
            })
            .transpose()?;

        Ok(Self::new(page_size, current_page, total_count))
    }

    /// Set the total count
    #[must_use]
    pub fn with_total_count(mut self, total_count: u64) -> Self {
        self.total_count = Some(total_count);
        self
    }

    /// Set the continuation token (empty tokens are dropped)
    #[must_use]
    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = token.into().none_if_empty();
        self
    }

    /// Check whether this is the "not computed yet" value
    pub fn is_empty(&self) -> bool {
        self.page_size == 0 && self.current_page == 0
    }

    /// Number of pages, when both the total and the page size are known
    pub fn total_pages(&self) -> Option<u64> {
        match (self.total_count, self.page_size) {
            (Some(total), size) if size > 0 => Some(total.div_ceil(u64::from(size))),
            _ => None,
        }
    }

    /// Whether another page can be fetched
    ///
    /// A continuation token always means yes; otherwise the answer comes from
    /// the total page count, and is `false` when it cannot be computed.
    pub fn has_next_page(&self) -> bool {
        if self.continuation_token.is_some() {
            return true;
        }
        self.total_pages()
            .is_some_and(|pages| u64::from(self.current_page) < pages)
    }
}
