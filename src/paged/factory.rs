//! Pagination factories
//!
//! A factory produces the [`Pagination`] of a paged stream: as a constant, as
//! an async computation that runs once (e.g. a count query), or derived from
//! enumeration progress under a [`PaginationStrategy`](crate::pagination::PaginationStrategy).

use crate::error::{Error, Result};
use crate::pagination::{Pagination, Progress};
use crate::types::ResultFuture;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Async pagination computation
pub type DeferredFn = Arc<dyn Fn(CancellationToken) -> ResultFuture<Pagination> + Send + Sync>;

/// Pagination derived from enumeration progress
pub type ProgressFn = Arc<dyn Fn(&Progress) -> Pagination + Send + Sync>;

/// How the pagination of a paged stream is produced
#[derive(Clone)]
pub enum PaginationFactory {
    /// Known up front
    Fixed(Pagination),

    /// Computed once by an async call, independent of enumeration
    Deferred(DeferredFn),

    /// Recomputed from progress as the strategy dictates
    FromProgress(ProgressFn),
}

impl PaginationFactory {
    /// Constant pagination
    pub fn fixed(pagination: Pagination) -> Self {
        Self::Fixed(pagination)
    }

    /// Pagination computed by an async call
    pub fn deferred<F, Fut>(compute: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Pagination>> + Send + 'static,
    {
        Self::Deferred(Arc::new(move |cancel: CancellationToken| -> ResultFuture<Pagination> {
            Box::pin(compute(cancel))
        }))
    }

    /// Pagination derived from enumeration progress
    pub fn from_progress<F>(compute: F) -> Self
    where
        F: Fn(&Progress) -> Pagination + Send + Sync + 'static,
    {
        Self::FromProgress(Arc::new(compute))
    }

    /// Running count of yielded items as the total, with the current page
    /// computed for `page_size`
    pub fn counting(page_size: u32) -> Self {
        Self::from_progress(move |progress| {
            Pagination::new(
                page_size,
                progress.page_for(page_size),
                Some(progress.items_yielded),
            )
        })
    }

    /// Whether the value depends on enumeration progress
    pub fn is_progress_derived(&self) -> bool {
        matches!(self, Self::FromProgress(_))
    }
}

impl fmt::Debug for PaginationFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(pagination) => f.debug_tuple("Fixed").field(pagination).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::FromProgress(_) => f.write_str("FromProgress(..)"),
        }
    }
}

impl From<Pagination> for PaginationFactory {
    fn from(pagination: Pagination) -> Self {
        Self::Fixed(pagination)
    }
}

// ============================================================================
// Shared cell
// ============================================================================

/// Pagination state shared by a paged stream and all of its enumerators
pub(crate) struct PaginationCell {
    factory: PaginationFactory,
    snapshot: RwLock<Option<Pagination>>,
    deferred: OnceCell<Pagination>,
}

impl PaginationCell {
    pub(crate) fn new(factory: PaginationFactory) -> Self {
        let snapshot = match &factory {
            PaginationFactory::Fixed(pagination) => Some(pagination.clone()),
            _ => None,
        };
        Self {
            factory,
            snapshot: RwLock::new(snapshot),
            deferred: OnceCell::new(),
        }
    }

    /// Last known value, or the default when nothing was computed yet
    pub(crate) fn current(&self) -> Pagination {
        self.snapshot.read().clone().unwrap_or_default()
    }

    /// Recompute a progress-derived value
    pub(crate) fn refresh(&self, progress: &Progress) {
        if let PaginationFactory::FromProgress(compute) = &self.factory {
            let pagination = compute(progress);
            *self.snapshot.write() = Some(pagination);
        }
    }

    /// Resolve the value without ever driving enumeration
    pub(crate) async fn resolve(&self, cancel: &CancellationToken) -> Result<Pagination> {
        match &self.factory {
            PaginationFactory::Fixed(pagination) => Ok(pagination.clone()),
            PaginationFactory::Deferred(compute) => {
                let init = self.deferred.get_or_try_init(|| compute(cancel.clone()));
                let pagination = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    resolved = init => resolved?.clone(),
                };
                debug!("Resolved deferred pagination: {:?}", pagination);
                *self.snapshot.write() = Some(pagination.clone());
                Ok(pagination)
            }
            PaginationFactory::FromProgress(compute) => {
                let mut snapshot = self.snapshot.write();
                let pagination = snapshot
                    .get_or_insert_with(|| compute(&Progress::default()))
                    .clone();
                Ok(pagination)
            }
        }
    }
}
