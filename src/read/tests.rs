//! Tests for the lazy envelope reader

use super::*;
use crate::codec::SerdeJson;
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::paged::{PagedEnumerable, PagedEnumerableExt};
use crate::pagination::Pagination;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const TWO_ITEMS: &str = r#"{"pagination":{"pageSize":2,"currentPage":1,"totalCount":2,"continuationToken":null},"items":[1,2]}"#;

fn reader<T: serde::de::DeserializeOwned + Send + 'static>(doc: &'static str) -> PagedReader<T> {
    read_paged_json(BytesSource::new(doc), &ReaderConfig::default())
}

async fn drain<T: Send + 'static>(paged: &PagedReader<T>) -> Result<Vec<T>> {
    let mut items = paged.items(CancellationToken::new());
    let mut out = Vec::new();
    while let Some(item) = items.next().await {
        out.push(item?);
    }
    Ok(out)
}

/// Source that counts how often it was pulled
struct CountingSource {
    chunks: VecDeque<Bytes>,
    reads: Arc<AtomicUsize>,
}

impl CountingSource {
    fn new(chunks: &[&'static str]) -> (Self, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = Self {
            chunks: chunks.iter().map(|c| Bytes::from_static(c.as_bytes())).collect(),
            reads: Arc::clone(&reads),
        };
        (source, reads)
    }
}

#[async_trait]
impl ByteSource for CountingSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.chunks.pop_front())
    }
}

// ============================================================================
// Envelope shapes
// ============================================================================

#[tokio::test]
async fn test_pagination_first_document() {
    let paged = reader::<u32>(TWO_ITEMS);
    let cancel = CancellationToken::new();

    let pagination = paged.resolve_pagination(&cancel).await.unwrap();
    assert_eq!(pagination, Pagination::new(2, 1, Some(2)));
    assert_eq!(drain(&paged).await.unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn test_items_first_document_resolved_before_enumeration() {
    let paged = reader::<u32>(r#"{"items":[1,2,3],"pagination":{"pageSize":3,"currentPage":2}}"#);

    let pagination = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(pagination.page_size, 3);
    assert_eq!(pagination.current_page, 2);
    assert_eq!(pagination.total_count, None);
    assert_eq!(drain(&paged).await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_items_first_document_drained_before_resolution() {
    let paged = reader::<u32>(r#"{"items":[7,8],"pagination":{"pageSize":2,"currentPage":1}}"#);

    assert_eq!(drain(&paged).await.unwrap(), vec![7, 8]);
    // draining reads through to the end of the document
    assert_eq!(paged.pagination(), Pagination::new(2, 1, None));

    let pagination = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(pagination, Pagination::new(2, 1, None));
    assert_eq!(paged.pagination(), pagination);
}

#[tokio::test]
async fn test_resolution_interleaved_with_enumeration() {
    let paged = reader::<u32>(r#"{"items":[1,2,3,4],"pagination":{"pageSize":4,"currentPage":1}}"#);
    let cancel = CancellationToken::new();

    let mut items = paged.items(cancel.clone());
    assert_eq!(items.next().await.unwrap().unwrap(), 1);

    let pagination = paged.resolve_pagination(&cancel).await.unwrap();
    assert_eq!(pagination.page_size, 4);

    let rest: Vec<u32> = items.map(|item| item.unwrap()).collect().await;
    assert_eq!(rest, vec![2, 3, 4]);
}

#[tokio::test]
async fn test_bare_array() {
    let paged = reader::<String>(r#" ["a", "b"] "#);

    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();

    assert_eq!(page.items, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(page.pagination, Pagination::empty());
}

#[tokio::test]
async fn test_empty_bare_array() {
    let paged = reader::<u32>("[]");

    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.pagination, Pagination::empty());
}

#[tokio::test]
async fn test_bare_array_pagination_resolves_without_buffering() {
    let (source, reads) = CountingSource::new(&[
        "[0,1,2,3,4,5,6,7,8,9,",
        "10,11,12,13,14,15,16,17,18,19]",
    ]);
    let paged: PagedReader<u32> =
        read_paged_json(source, &ReaderConfig::default().with_max_buffered_items(5));

    let pagination = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(pagination, Pagination::default());
    assert_eq!(reads.load(Ordering::SeqCst), 1);

    assert_eq!(drain(&paged).await.unwrap(), (0..20).collect::<Vec<u32>>());
}

#[test]
fn test_debug_shows_pagination_and_enumeration() {
    let paged = PagedReader::<u32>::empty();
    let text = format!("{paged:?}");
    assert!(text.contains("PagedReader"));
    assert!(text.contains("enumerated: false"));
}

#[tokio::test]
async fn test_empty_items_array() {
    let paged = reader::<u32>(
        r#"{"pagination":{"pageSize":10,"currentPage":1,"totalCount":0},"items":[]}"#,
    );

    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.pagination.total_count, Some(0));
}

#[tokio::test]
async fn test_explicit_empty_reader() {
    let paged = PagedReader::<u32>::empty();

    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.pagination, Pagination::empty());
}

#[tokio::test]
async fn test_case_insensitive_names_and_unknown_properties() {
    let doc = r#"{
        "meta": {"note": "]}", "list": [1, {"x": null}]},
        "Items": [ {"id": 1}, {"id": 2} ],
        "PAGINATION": {"PageSize": 5, "CurrentPage": 2, "TotalCount": 12},
        "trailer": true
    }"#;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    let paged = reader::<Row>(doc);
    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();

    assert_eq!(page.items, vec![Row { id: 1 }, Row { id: 2 }]);
    assert_eq!(page.pagination, Pagination::new(5, 2, Some(12)));
}

#[tokio::test]
async fn test_null_pagination_and_items() {
    let paged = reader::<u32>(r#"{"pagination":null,"items":null}"#);

    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.pagination, Pagination::empty());
}

// ============================================================================
// Laziness and chunking
// ============================================================================

#[tokio::test]
async fn test_construction_reads_nothing() {
    let (source, reads) = CountingSource::new(&[TWO_ITEMS]);

    let paged: PagedReader<u32> = read_paged(source, Arc::new(SerdeJson), &ReaderConfig::default());
    assert_eq!(reads.load(Ordering::SeqCst), 0);
    assert_eq!(paged.pagination(), Pagination::empty());
    assert_eq!(reads.load(Ordering::SeqCst), 0);

    let mut items = paged.items(CancellationToken::new());
    assert_eq!(reads.load(Ordering::SeqCst), 0);
    assert_eq!(items.next().await.unwrap().unwrap(), 1);
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pagination_read_stops_at_pagination() {
    let (source, reads) = CountingSource::new(&[
        r#"{"pagination":{"pageSize":1,"currentPage":1},"#,
        r#""items":[1,"#,
        "2]}",
    ]);
    let paged: PagedReader<u32> = read_paged_json(source, &ReaderConfig::default());

    paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 1);

    assert_eq!(drain(&paged).await.unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn test_values_split_across_reads() {
    let mock = tokio_test::io::Builder::new()
        .read(br#"{"pagi"#)
        .read(br#"nation":{"pageSize":3,"curr"#)
        .read(br#"entPage":1},"items":[{"name":"a\"#)
        .read(br#""b"},{"name":"c,d"},{"na"#)
        .read(br#"me":"e"}]}"#)
        .build();

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    let paged: PagedReader<Named> = read_paged_json(
        ReaderSource::new(mock, 8),
        &ReaderConfig::default(),
    );
    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();

    let names: Vec<_> = page.items.into_iter().map(|n| n.name).collect();
    assert_eq!(names, vec!["a\"b", "c,d", "e"]);
    assert_eq!(page.pagination.page_size, 3);
}

#[tokio::test]
async fn test_stream_source_over_duplex_pipe() {
    let (mut client, server) = tokio::io::duplex(16);
    let writer = tokio::spawn(async move {
        use tokio::io::AsyncWriteExt;
        client.write_all(TWO_ITEMS.as_bytes()).await.unwrap();
    });

    let paged: PagedReader<u32> =
        read_paged_json(ReaderSource::new(server, 4), &ReaderConfig::default());
    let page = paged.collect_page(&CancellationToken::new()).await.unwrap();
    writer.await.unwrap();

    assert_eq!(page.items, vec![1, 2]);
    assert_eq!(page.pagination, Pagination::new(2, 1, Some(2)));
}

#[tokio::test]
async fn test_stream_source_propagates_errors() {
    let chunks = futures::stream::iter(vec![
        Ok(Bytes::from_static(b"[1,")),
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "reset")),
    ]);
    let paged: PagedReader<u32> =
        read_paged_json(StreamSource::new(chunks), &ReaderConfig::default());

    let mut items = paged.items(CancellationToken::new());
    assert_eq!(items.next().await.unwrap().unwrap(), 1);
    assert!(matches!(items.next().await.unwrap(), Err(Error::Io(_))));
    assert!(items.next().await.is_none());
}

// ============================================================================
// Malformed input
// ============================================================================

#[tokio::test]
async fn test_malformed_item_reported_lazily_with_offset() {
    let paged = reader::<u32>(r#"{"pagination":null,"items":[1,2,x]}"#);
    let mut items = paged.items(CancellationToken::new());

    assert_eq!(items.next().await.unwrap().unwrap(), 1);
    assert_eq!(items.next().await.unwrap().unwrap(), 2);
    let err = items.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Format { offset: 32, .. }), "{err}");
    assert!(items.next().await.is_none());
}

#[tokio::test]
async fn test_empty_source_is_format_error() {
    let paged = reader::<u32>("   ");

    let err = drain(&paged).await.unwrap_err();

    assert!(err.is_format());
}

#[tokio::test]
async fn test_duplicate_items_property() {
    let paged = reader::<u32>(r#"{"items":[1],"items":[2]}"#);

    let err = drain(&paged).await.unwrap_err();

    assert!(matches!(err, Error::Format { offset: 13, .. }), "{err}");
}

#[tokio::test]
async fn test_truncated_document() {
    let paged = reader::<u32>(r#"{"pagination":{"pageSize":1},"items":[1,2"#);

    let err = drain(&paged).await.unwrap_err();

    assert!(err.is_format());
}

#[tokio::test]
async fn test_trailing_data() {
    let paged = reader::<u32>("[1] [2]");

    let err = drain(&paged).await.unwrap_err();

    assert!(matches!(err, Error::Format { offset: 4, .. }), "{err}");
}

#[tokio::test]
async fn test_trailing_comma() {
    let paged = reader::<u32>("[1,]");

    let err = drain(&paged).await.unwrap_err();

    assert!(matches!(err, Error::Format { offset: 3, .. }), "{err}");
}

#[tokio::test]
async fn test_invalid_pagination_object() {
    let paged = reader::<u32>(r#"{"pagination":{"pageSize":-1},"items":[]}"#);

    let err = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Format { offset: 14, .. }), "{err}");
}

#[tokio::test]
async fn test_item_type_mismatch_is_not_a_syntax_error() {
    let paged = reader::<u32>(r#"["seven"]"#);

    let err = drain(&paged).await.unwrap_err();

    assert!(matches!(err, Error::JsonParse(_)));
}

// ============================================================================
// Limits, single enumeration, cancellation
// ============================================================================

#[tokio::test]
async fn test_pagination_buffer_limit() {
    let paged: PagedReader<u32> = read_paged_json(
        BytesSource::new(r#"{"items":[1,2,3],"pagination":{"pageSize":3,"currentPage":1}}"#),
        &ReaderConfig::default().with_max_buffered_items(1),
    );

    let err = paged
        .resolve_pagination(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PaginationBufferExceeded { limit: 1 }));

    // buffered items are not lost
    assert_eq!(drain(&paged).await.unwrap(), vec![1, 2, 3]);
    assert_eq!(paged.pagination().page_size, 3);
}

#[tokio::test]
async fn test_value_size_limit() {
    let paged: PagedReader<String> = read_paged_json(
        BytesSource::new(r#"["short","much longer than allowed"]"#),
        &ReaderConfig::default().with_max_value_bytes(10),
    );

    let mut items = paged.items(CancellationToken::new());
    assert_eq!(items.next().await.unwrap().unwrap(), "short");
    assert!(matches!(
        items.next().await.unwrap(),
        Err(Error::ValueTooLarge { limit: 10, .. })
    ));
}

#[tokio::test]
async fn test_items_enumerated_once() {
    let paged = reader::<u32>(TWO_ITEMS);

    assert_eq!(drain(&paged).await.unwrap(), vec![1, 2]);
    assert!(paged.is_enumerated());
    assert!(matches!(drain(&paged).await, Err(Error::SourceConsumed)));
}

#[tokio::test]
async fn test_cancel_while_waiting_for_bytes() {
    let (_client, server) = tokio::io::duplex(16);
    let paged: PagedReader<u32> =
        read_paged_json(ReaderSource::new(server, 16), &ReaderConfig::default());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = paged.resolve_pagination(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());

    let mut items = paged.items(cancel.clone());
    assert!(items.next().await.unwrap().unwrap_err().is_cancelled());
    assert!(items.next().await.is_none());
}
