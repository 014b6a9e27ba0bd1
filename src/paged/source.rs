//! Item sources behind a paged stream
//!
//! A source is either single-shot (a stream handed over once) or restartable
//! (a factory producing a fresh stream per enumeration).

use crate::error::{Error, Result};
use crate::types::ItemStream;
use futures::Stream;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type OpenOnce<T> = Box<dyn FnOnce(CancellationToken) -> ItemStream<T> + Send>;
type OpenMany<T> = Arc<dyn Fn(CancellationToken) -> ItemStream<T> + Send + Sync>;

/// Where the items of a paged stream come from
pub(crate) enum ItemSource<T> {
    /// Can be opened exactly once
    Once(Mutex<Option<OpenOnce<T>>>),
    /// Opens an independent stream every time
    Restartable(OpenMany<T>),
}

impl<T: Send + 'static> ItemSource<T> {
    /// Wrap a single-shot stream
    pub(crate) fn once<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        let open: OpenOnce<T> = Box::new(move |_: CancellationToken| -> ItemStream<T> {
            Box::pin(stream)
        });
        Self::Once(Mutex::new(Some(open)))
    }

    /// Wrap a stream factory
    pub(crate) fn restartable<F, S>(factory: F) -> Self
    where
        F: Fn(CancellationToken) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self::Restartable(Arc::new(move |cancel: CancellationToken| -> ItemStream<T> {
            Box::pin(factory(cancel))
        }))
    }

    /// Whether the source can be enumerated more than once
    pub(crate) fn is_restartable(&self) -> bool {
        matches!(self, Self::Restartable(_))
    }

    /// Open a new enumeration
    pub(crate) fn open(&self, cancel: CancellationToken) -> Result<ItemStream<T>> {
        match self {
            Self::Once(slot) => slot
                .lock()
                .take()
                .map(|open| open(cancel))
                .ok_or(Error::SourceConsumed),
            Self::Restartable(factory) => Ok(factory(cancel)),
        }
    }

    /// Layer a stream transformation on top of this source
    pub(crate) fn compose<U, G>(self, transform: G) -> ItemSource<U>
    where
        U: Send + 'static,
        G: Fn(ItemStream<T>, CancellationToken) -> ItemStream<U> + Send + Sync + 'static,
    {
        match self {
            Self::Once(slot) => {
                let open = slot.into_inner().map(|open| {
                    let composed: OpenOnce<U> = Box::new(move |cancel: CancellationToken| {
                        transform(open(cancel.clone()), cancel)
                    });
                    composed
                });
                ItemSource::Once(Mutex::new(open))
            }
            Self::Restartable(factory) => {
                ItemSource::Restartable(Arc::new(move |cancel: CancellationToken| {
                    transform(factory(cancel.clone()), cancel)
                }))
            }
        }
    }
}
