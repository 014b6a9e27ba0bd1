//! Tests for paged stream module

use super::*;
use crate::error::{Error, Result};
use crate::pagination::{Pagination, PaginationStrategy};
use futures::{stream, StreamExt};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn numbers(count: u32) -> impl futures::Stream<Item = Result<u32>> + Send + 'static {
    stream::iter((1..=count).map(Ok))
}

async fn drain<T: Send + 'static>(paged: &dyn PagedEnumerable<T>) -> Vec<Result<T>> {
    paged.items(CancellationToken::new()).collect().await
}

// ============================================================================
// Sources
// ============================================================================

#[tokio::test]
async fn test_from_vec_is_restartable() {
    let paged = PagedStream::from_vec(vec![1, 2, 3], Pagination::new(3, 1, Some(3)));
    assert!(paged.is_restartable());

    let cancel = CancellationToken::new();
    let first = paged.collect_page(&cancel).await.unwrap();
    let second = paged.collect_page(&cancel).await.unwrap();

    assert_eq!(first.items, vec![1, 2, 3]);
    assert_eq!(first, second);
    assert_eq!(first.pagination, Pagination::new(3, 1, Some(3)));
}

#[tokio::test]
async fn test_single_shot_source_is_consumed_once() {
    let paged = PagedStream::new(numbers(2), Pagination::empty());
    assert!(!paged.is_restartable());

    let first: Vec<u32> = drain(&paged)
        .await
        .into_iter()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(first, vec![1, 2]);

    let second = drain(&paged).await;
    assert_eq!(second.len(), 1);
    assert!(matches!(second[0], Err(Error::SourceConsumed)));
}

#[tokio::test]
async fn test_from_fn_opens_fresh_stream_each_time() {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opened);
    let paged = PagedStream::from_fn(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            numbers(3)
        },
        Pagination::empty(),
    );

    // Opening is lazy
    assert_eq!(opened.load(Ordering::SeqCst), 0);
    assert_eq!(drain(&paged).await.len(), 3);
    assert_eq!(drain(&paged).await.len(), 3);
    assert_eq!(opened.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_empty_stream() {
    let paged = PagedStream::<u32>::empty(Pagination::new(10, 1, Some(0)));
    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.pagination.total_count, Some(0));
}

// ============================================================================
// Pagination factories and strategies
// ============================================================================

#[tokio::test]
async fn test_fixed_pagination_is_available_synchronously() {
    let pagination = Pagination::new(50, 2, Some(120)).with_continuation_token("c3");
    let paged = PagedStream::new(numbers(1), pagination.clone());
    assert_eq!(paged.pagination(), pagination);
    assert_eq!(
        paged
            .resolve_pagination(&CancellationToken::new())
            .await
            .unwrap(),
        pagination
    );
}

#[tokio::test]
async fn test_counted_total_matches_items_after_enumeration() {
    let paged = PagedStream::counted(numbers(7), 3);
    assert_eq!(paged.strategy(), PaginationStrategy::per_page(3));
    assert!(paged.pagination().is_empty());

    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();
    assert_eq!(page.items.len(), 7);
    assert_eq!(page.pagination, Pagination::new(3, 3, Some(7)));
    assert_eq!(paged.pagination(), page.pagination);
}

#[tokio::test]
async fn test_progress_pagination_before_enumeration_is_provisional() {
    let paged = PagedStream::counted(numbers(4), 2);
    let before = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(before, Pagination::new(2, 0, Some(0)));

    drain(&paged).await;
    let after = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(after, Pagination::new(2, 2, Some(4)));
}

#[tokio::test]
async fn test_per_page_current_page_is_monotonic() {
    let page_size = 5;
    let paged = PagedStream::counted(numbers(23), page_size);
    let mut items = paged.items(CancellationToken::new());

    let mut last_page = 0;
    let mut yielded = 0u32;
    let mut changes = Vec::new();
    while let Some(item) = items.next().await {
        item.unwrap();
        yielded += 1;
        let page = paged.pagination().current_page;
        assert!(page >= last_page, "page went backwards");
        if page != last_page {
            changes.push(yielded);
        }
        last_page = page;
    }

    // Pages change on the first item of each page only
    assert_eq!(changes, vec![1, 6, 11, 16, 21]);
    assert_eq!(paged.pagination(), Pagination::new(5, 5, Some(23)));
}

#[tokio::test]
async fn test_per_item_strategy_refreshes_every_item() {
    let paged = PagedStream::new(numbers(4), PaginationFactory::counting(0))
        .with_strategy(PaginationStrategy::PerItem);
    let mut items = paged.items(CancellationToken::new());

    let mut expected = 0u64;
    while let Some(item) = items.next().await {
        item.unwrap();
        expected += 1;
        assert_eq!(paged.pagination().total_count, Some(expected));
    }
    assert_eq!(expected, 4);
}

#[tokio::test]
async fn test_none_strategy_refreshes_progress_pagination_only_at_completion() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let factory = PaginationFactory::from_progress(move |progress| {
        counter.fetch_add(1, Ordering::SeqCst);
        Pagination::new(10, 1, Some(progress.items_yielded))
    });
    let paged = PagedStream::new(numbers(3), factory);
    let cancel = CancellationToken::new();

    let before = paged.resolve_pagination(&cancel).await.unwrap();
    assert_eq!(before.total_count, Some(0));

    let mut items = paged.items(cancel.clone());
    items.next().await.unwrap().unwrap();
    items.next().await.unwrap().unwrap();
    assert_eq!(paged.pagination().total_count, Some(0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    items.next().await.unwrap().unwrap();
    assert!(items.next().await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        paged.resolve_pagination(&cancel).await.unwrap().total_count,
        Some(3)
    );
}

#[tokio::test]
async fn test_counting_without_strategy_is_exact_after_enumeration() {
    let paged = PagedStream::new(numbers(5), PaginationFactory::counting(2));
    assert_eq!(paged.strategy(), PaginationStrategy::None);

    drain(&paged).await;

    let pagination = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(pagination, Pagination::new(2, 3, Some(5)));
}

#[tokio::test]
async fn test_deferred_pagination_resolves_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let factory = PaginationFactory::deferred(move |_| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Pagination::new(100, 1, Some(100_000)))
        }
    });
    let paged = PagedStream::new(numbers(1), factory);
    assert!(paged.pagination().is_empty());

    let cancel = CancellationToken::new();
    let resolved = paged.resolve_pagination(&cancel).await.unwrap();
    assert_eq!(resolved.total_count, Some(100_000));
    paged.resolve_pagination(&cancel).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(paged.pagination(), resolved);
}

#[tokio::test]
async fn test_deferred_pagination_error_propagates() {
    let factory =
        PaginationFactory::deferred(|_| async { Err(Error::Other("count query failed".into())) });
    let paged = PagedStream::new(numbers(1), factory);
    let err = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("count query failed"));
}

#[tokio::test]
async fn test_deferred_pagination_cancellation() {
    let factory = PaginationFactory::deferred(|_| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Pagination::empty())
    });
    let paged = PagedStream::new(numbers(1), factory);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = paged.resolve_pagination(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}

// ============================================================================
// Mapping
// ============================================================================

#[tokio::test]
async fn test_map_is_lazy_and_shares_pagination() {
    let mapped_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&mapped_count);
    let paged = PagedStream::counted(numbers(3), 10).map(move |n| {
        counter.fetch_add(1, Ordering::SeqCst);
        format!("item-{n}")
    });
    assert_eq!(mapped_count.load(Ordering::SeqCst), 0);

    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();
    assert_eq!(page.items, vec!["item-1", "item-2", "item-3"]);
    assert_eq!(page.pagination.total_count, Some(3));
    assert_eq!(mapped_count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_try_map_error_surfaces_at_item() {
    let paged = PagedStream::from_vec(vec![1, 2, 3, 4], Pagination::empty()).try_map(|n| {
        if n == 3 {
            Err(Error::mapping("three is not allowed"))
        } else {
            Ok(n * 10)
        }
    });

    let results = drain(&paged).await;
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_ref().unwrap(), &10);
    assert_eq!(results[1].as_ref().unwrap(), &20);
    assert!(matches!(results[2], Err(Error::Mapping { .. })));
    assert_eq!(results[3].as_ref().unwrap(), &40);
}

#[tokio::test]
async fn test_map_async_receives_cancellation_token() {
    let paged = PagedStream::from_vec(vec![1u32, 2], Pagination::empty()).map_async(
        |n, cancel: CancellationToken| async move {
            assert!(!cancel.is_cancelled());
            tokio::task::yield_now().await;
            Ok(n + 100)
        },
    );

    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();
    assert_eq!(page.items, vec![101, 102]);
}

#[tokio::test]
async fn test_map_on_restartable_source_stays_restartable() {
    let paged = PagedStream::from_vec(vec![1, 2], Pagination::empty()).map(|n| n * 2);
    assert!(paged.is_restartable());
    assert_eq!(drain(&paged).await.len(), 2);
    assert_eq!(drain(&paged).await.len(), 2);
}

// ============================================================================
// Failures and cancellation
// ============================================================================

#[tokio::test]
async fn test_source_error_leaves_partial_pagination() {
    let source = stream::iter(vec![
        Ok(1u32),
        Ok(2),
        Err(Error::Other("cursor lost".into())),
    ]);
    let paged = PagedStream::new(source, PaginationFactory::counting(10))
        .with_strategy(PaginationStrategy::PerItem);

    let results = drain(&paged).await;
    assert_eq!(results.len(), 3);
    assert!(results[2].is_err());
    assert_eq!(paged.pagination().total_count, Some(2));
}

#[tokio::test]
async fn test_cancellation_mid_enumeration() {
    let paged = PagedStream::new(
        stream::iter(1..=1000u32).then(|n| async move {
            tokio::task::yield_now().await;
            Ok::<u32, Error>(n)
        }),
        Pagination::empty(),
    );
    let cancel = CancellationToken::new();
    let mut items = paged.items(cancel.clone());

    assert_eq!(items.next().await.unwrap().unwrap(), 1);
    assert_eq!(items.next().await.unwrap().unwrap(), 2);
    cancel.cancel();

    let next = items.next().await.unwrap();
    assert!(next.unwrap_err().is_cancelled());
    assert!(items.next().await.is_none());
}

#[tokio::test]
async fn test_cancellation_interrupts_pending_item() {
    let paged = PagedStream::new(
        stream::pending::<Result<u32>>(),
        Pagination::empty(),
    );
    let cancel = CancellationToken::new();
    let mut items = paged.items(cancel.clone());

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), items.next())
        .await
        .expect("cancellation should wake the pending await");
    assert!(outcome.unwrap().unwrap_err().is_cancelled());
}

// ============================================================================
// Page
// ============================================================================

#[test]
fn test_page_serializes_as_envelope() {
    let page = Page::new(vec![1, 2], Pagination::new(2, 1, Some(2)));
    let json = serde_json::to_string(&page).unwrap();
    assert_eq!(
        json,
        r#"{"pagination":{"pageSize":2,"currentPage":1,"totalCount":2,"continuationToken":null},"items":[1,2]}"#
    );
}

#[tokio::test]
async fn test_page_into_paged_stream() {
    let page = Page::new(vec!["a".to_string()], Pagination::new(1, 1, Some(1)));
    let paged: PagedStream<String> = page.clone().into();
    let collected = paged.collect_page(&CancellationToken::new()).await.unwrap();
    assert_eq!(collected, page);
}
