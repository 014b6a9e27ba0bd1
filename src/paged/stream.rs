//! The paged enumerable contract and its in-process implementation

use super::adapters::{Cancellable, Tracked};
use super::factory::{PaginationCell, PaginationFactory};
use super::source::ItemSource;
use crate::error::Result;
use crate::pagination::{Pagination, PaginationStrategy, PaginationTracker};
use crate::types::ItemStream;
use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// An async sequence of items paired with lazily resolved pagination
#[async_trait]
pub trait PagedEnumerable<T>: Send + Sync {
    /// Last known pagination, or the default when none was computed yet
    ///
    /// Never blocks and never drives enumeration.
    fn pagination(&self) -> Pagination;

    /// Resolve the pagination
    ///
    /// Safe to call before, during or after enumeration. It never enumerates
    /// items itself: a value derived from enumeration progress reflects only
    /// the items yielded so far, and is final once an enumeration completed.
    async fn resolve_pagination(&self, cancel: &CancellationToken) -> Result<Pagination>;

    /// Start an independent enumeration
    ///
    /// Cancelling `cancel` ends the stream with [`Error::Cancelled`](crate::Error::Cancelled).
    fn items(&self, cancel: CancellationToken) -> ItemStream<T>;
}

/// Items and pagination collected from a paged stream
///
/// Serializes as the wire envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Pagination metadata
    #[serde(default)]
    pub pagination: Pagination,
    /// Items of the page
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self { pagination, items }
    }
}

/// Convenience operations for every paged enumerable
#[async_trait]
pub trait PagedEnumerableExt<T: Send + 'static>: PagedEnumerable<T> {
    /// Enumerate all items, then resolve the pagination
    async fn collect_page(&self, cancel: &CancellationToken) -> Result<Page<T>> {
        let mut items = Vec::new();
        let mut stream = self.items(cancel.clone());
        while let Some(item) = stream.next().await {
            items.push(item?);
        }
        let pagination = self.resolve_pagination(cancel).await?;
        Ok(Page::new(items, pagination))
    }
}

impl<T: Send + 'static, P: PagedEnumerable<T> + ?Sized> PagedEnumerableExt<T> for P {}

// ============================================================================
// PagedStream
// ============================================================================

/// A paged enumerable over any async item source
///
/// Items are produced lazily. A stream handed over with [`PagedStream::new`]
/// can be enumerated once; sources built with [`PagedStream::from_fn`] or
/// [`PagedStream::from_vec`] restart on every call to `items`.
pub struct PagedStream<T> {
    source: ItemSource<T>,
    pagination: Arc<PaginationCell>,
    strategy: PaginationStrategy,
}

impl<T: Send + 'static> PagedStream<T> {
    /// Wrap a single-shot stream
    pub fn new<S>(stream: S, factory: impl Into<PaginationFactory>) -> Self
    where
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self::from_source(ItemSource::once(stream), factory.into())
    }

    /// Wrap a stream factory; every enumeration opens a fresh stream
    pub fn from_fn<F, S>(factory: F, pagination: impl Into<PaginationFactory>) -> Self
    where
        F: Fn(CancellationToken) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self::from_source(ItemSource::restartable(factory), pagination.into())
    }

    /// In-memory items with known pagination
    pub fn from_vec(items: Vec<T>, pagination: Pagination) -> Self
    where
        T: Clone + Sync,
    {
        let items = Arc::new(items);
        Self::from_fn(
            move |_| stream::iter(items.as_ref().clone().into_iter().map(Ok)),
            pagination,
        )
    }

    /// A stream without items
    pub fn empty(pagination: Pagination) -> Self {
        Self::new(stream::empty(), pagination)
    }

    /// Single-shot stream whose pagination counts the yielded items,
    /// refreshed at every page boundary
    pub fn counted<S>(stream: S, page_size: u32) -> Self
    where
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self::new(stream, PaginationFactory::counting(page_size))
            .with_strategy(PaginationStrategy::per_page(page_size))
    }

    fn from_source(source: ItemSource<T>, factory: PaginationFactory) -> Self {
        Self {
            source,
            pagination: Arc::new(PaginationCell::new(factory)),
            strategy: PaginationStrategy::None,
        }
    }

    /// Set the refresh strategy used by new enumerations
    #[must_use]
    pub fn with_strategy(mut self, strategy: PaginationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Refresh strategy
    pub fn strategy(&self) -> PaginationStrategy {
        self.strategy
    }

    /// Whether `items` can be called more than once
    pub fn is_restartable(&self) -> bool {
        self.source.is_restartable()
    }

    /// Project every item with a synchronous function
    pub fn map<U, F>(self, map: F) -> PagedStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let map = Arc::new(map);
        self.transform(move |items, _| {
            let map = Arc::clone(&map);
            Box::pin(items.map(move |item| item.map(|item| map(item))))
        })
    }

    /// Project every item with a fallible function; an error surfaces at
    /// the item that produced it
    pub fn try_map<U, F>(self, map: F) -> PagedStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Result<U> + Send + Sync + 'static,
    {
        let map = Arc::new(map);
        self.transform(move |items, _| {
            let map = Arc::clone(&map);
            Box::pin(items.map(move |item| item.and_then(|item| map(item))))
        })
    }

    /// Project every item with an async function receiving the
    /// enumeration's cancellation token
    pub fn map_async<U, F, Fut>(self, map: F) -> PagedStream<U>
    where
        U: Send + 'static,
        F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
    {
        let map = Arc::new(map);
        self.transform(move |items, cancel| {
            let map = Arc::clone(&map);
            Box::pin(items.then(move |item| {
                let map = Arc::clone(&map);
                let cancel = cancel.clone();
                async move {
                    match item {
                        Ok(item) => map(item, cancel).await,
                        Err(e) => Err(e),
                    }
                }
            }))
        })
    }

    fn transform<U, G>(self, transform: G) -> PagedStream<U>
    where
        U: Send + 'static,
        G: Fn(ItemStream<T>, CancellationToken) -> ItemStream<U> + Send + Sync + 'static,
    {
        PagedStream {
            source: self.source.compose(transform),
            pagination: self.pagination,
            strategy: self.strategy,
        }
    }
}

#[async_trait]
impl<T: Send + 'static> PagedEnumerable<T> for PagedStream<T> {
    fn pagination(&self) -> Pagination {
        self.pagination.current()
    }

    async fn resolve_pagination(&self, cancel: &CancellationToken) -> Result<Pagination> {
        self.pagination.resolve(cancel).await
    }

    fn items(&self, cancel: CancellationToken) -> ItemStream<T> {
        match self.source.open(cancel.clone()) {
            Ok(items) => {
                let tracker = PaginationTracker::new(self.strategy);
                let tracked = Tracked::new(items, tracker, Arc::clone(&self.pagination));
                Box::pin(Cancellable::new(tracked, cancel))
            }
            Err(e) => Box::pin(stream::once(async move { Err(e) })),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> From<Page<T>> for PagedStream<T> {
    fn from(page: Page<T>) -> Self {
        Self::from_vec(page.items, page.pagination)
    }
}
