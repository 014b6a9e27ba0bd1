//! Stream adapters used by paged streams
//!
//! [`Cancellable`] ends a stream with [`Error::Cancelled`] once its token
//! fires; `Tracked` feeds every yielded item into a pagination tracker.

use super::factory::PaginationCell;
use crate::error::{Error, Result};
use crate::pagination::PaginationTracker;
use futures::Stream;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::debug;

pin_project! {
    /// Stream that yields `Err(Error::Cancelled)` and ends once its token is cancelled
    pub struct Cancellable<S> {
        #[pin]
        inner: S,
        #[pin]
        cancelled: WaitForCancellationFutureOwned,
        done: bool,
    }
}

impl<S> Cancellable<S> {
    /// Wrap a stream with a cancellation token
    pub fn new(inner: S, cancel: CancellationToken) -> Self {
        Self {
            inner,
            cancelled: cancel.cancelled_owned(),
            done: false,
        }
    }
}

impl<S, T> Stream for Cancellable<S>
where
    S: Stream<Item = Result<T>>,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }
        if this.cancelled.poll(cx).is_ready() {
            *this.done = true;
            return Poll::Ready(Some(Err(Error::Cancelled)));
        }
        match this.inner.poll_next(cx) {
            Poll::Ready(None) => {
                *this.done = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

pin_project! {
    /// Stream that reports progress to a shared pagination cell
    pub(crate) struct Tracked<S> {
        #[pin]
        inner: S,
        tracker: PaginationTracker,
        cell: Arc<PaginationCell>,
    }
}

impl<S> Tracked<S> {
    pub(crate) fn new(inner: S, tracker: PaginationTracker, cell: Arc<PaginationCell>) -> Self {
        Self {
            inner,
            tracker,
            cell,
        }
    }
}

impl<S, T> Stream for Tracked<S>
where
    S: Stream<Item = Result<T>>,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => {
                if this.tracker.record_item() {
                    this.cell.refresh(&this.tracker.progress());
                }
                Poll::Ready(Some(Ok(item)))
            }
            Poll::Ready(None) => {
                if this.tracker.complete() {
                    this.cell.refresh(&this.tracker.progress());
                }
                debug!(
                    "Enumeration complete after {} items",
                    this.tracker.progress().items_yielded
                );
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
