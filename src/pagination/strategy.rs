//! Pagination refresh strategies
//!
//! A strategy decides when a progress-derived pagination snapshot is
//! recomputed while a paged stream is being enumerated.

use serde::{Deserialize, Serialize};

/// When pagination is recomputed relative to enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaginationStrategy {
    /// Not refreshed while items are yielded; a progress-derived value is
    /// computed once enumeration completes
    #[default]
    None,

    /// Refreshed each time the running count enters a new page, and at completion
    PerPage {
        /// Items per page (0 is treated as 1)
        page_size: u32,
    },

    /// Refreshed after every item, and at completion
    PerItem,
}

impl PaginationStrategy {
    /// Create a per-page strategy
    pub fn per_page(page_size: u32) -> Self {
        Self::PerPage { page_size }
    }

    /// Whether the snapshot is refreshed while items are yielded
    pub fn tracks_progress(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Enumeration progress handed to progress-derived pagination factories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Items yielded so far
    pub items_yielded: u64,
    /// Whether the source has been exhausted
    pub completed: bool,
}

impl Progress {
    /// 1-based page holding the most recent item for a given page size
    ///
    /// Returns 0 before the first item.
    pub fn page_for(&self, page_size: u32) -> u32 {
        if self.items_yielded == 0 {
            return 0;
        }
        let size = u64::from(page_size.max(1));
        let page = (self.items_yielded - 1) / size + 1;
        u32::try_from(page).unwrap_or(u32::MAX)
    }
}

/// Per-enumerator state machine driving snapshot refreshes
///
/// The strategy is fixed when the tracker is created.
#[derive(Debug, Clone)]
pub struct PaginationTracker {
    strategy: PaginationStrategy,
    progress: Progress,
}

impl PaginationTracker {
    /// Create a tracker for a strategy
    pub fn new(strategy: PaginationStrategy) -> Self {
        Self {
            strategy,
            progress: Progress::default(),
        }
    }

    /// The strategy this tracker was created with
    pub fn strategy(&self) -> PaginationStrategy {
        self.strategy
    }

    /// Current progress
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Record a yielded item; returns true when the snapshot should be refreshed
    pub fn record_item(&mut self) -> bool {
        self.progress.items_yielded += 1;
        match self.strategy {
            PaginationStrategy::None => false,
            PaginationStrategy::PerItem => true,
            PaginationStrategy::PerPage { page_size } => {
                let size = u64::from(page_size.max(1));
                (self.progress.items_yielded - 1) % size == 0
            }
        }
    }

    /// Record source exhaustion; returns true when the snapshot should be refreshed
    pub fn complete(&mut self) -> bool {
        if self.progress.completed {
            return false;
        }
        self.progress.completed = true;
        true
    }
}
