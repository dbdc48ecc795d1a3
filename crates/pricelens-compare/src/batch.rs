//! Strictly-sequential batch orchestration.
//!
//! One keyword's search must fully settle before the next dispatches — a
//! deliberate throttle on upstream load. Do not parallelize this loop; the
//! fan-out inside each aggregate call is where concurrency lives.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pricelens_core::{ProductResult, SearchFilters};

use crate::error::CompareError;
use crate::service::{ComparisonService, KeywordSearch};

/// Hard cap on items per batch; submissions beyond it are dropped up front.
pub const MAX_BATCH_ITEMS: usize = 100;

/// One keyword search as the batch loop sees it. The seam exists so the
/// orchestrator can be exercised against an in-memory fake.
#[async_trait]
pub trait BatchSearcher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CompareError`] for request-level failures; per-platform
    /// failures are already absorbed below this seam.
    async fn search_keyword(&self, keyword: &str) -> Result<Vec<ProductResult>, CompareError>;
}

/// [`ComparisonService`] bound to one platform set for batch use.
pub struct PlatformBoundSearcher<'a> {
    service: &'a ComparisonService,
    platforms: Vec<String>,
}

impl ComparisonService {
    /// Binds this service to a platform set, producing the searcher the
    /// batch runner drives.
    #[must_use]
    pub fn bound_to(&self, platforms: Vec<String>) -> PlatformBoundSearcher<'_> {
        PlatformBoundSearcher {
            service: self,
            platforms,
        }
    }
}

#[async_trait]
impl BatchSearcher for PlatformBoundSearcher<'_> {
    async fn search_keyword(&self, keyword: &str) -> Result<Vec<ProductResult>, CompareError> {
        self.service
            .search_by_keyword(&KeywordSearch {
                keyword: keyword.to_owned(),
                platforms: self.platforms.clone(),
                filters: SearchFilters::default(),
            })
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Searching,
    Completed,
    Error,
}

/// One keyword's slot in a batch. Status transitions are
/// `pending → searching → completed | error`, each item exactly once, owned
/// exclusively by the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: usize,
    pub keyword: String,
    pub status: BatchStatus,
    /// Populated on `completed`.
    pub results: Vec<ProductResult>,
    /// Populated on `error`.
    pub error: Option<String>,
}

/// Monotonic progress snapshot emitted after each item settles and before
/// the next one dispatches.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    /// Items settled so far (completed or failed).
    pub settled: usize,
    pub total: usize,
    /// Results accumulated across all settled items.
    pub accumulated_results: usize,
}

#[derive(Debug)]
pub struct BatchOutcome {
    /// Every item with its terminal status; failed items carry their error
    /// message.
    pub items: Vec<BatchItem>,
    /// Flattened results of the successful items, in item order.
    pub results: Vec<ProductResult>,
    /// Keywords of the items that completed successfully — the list history
    /// recording consumes. Failed items are visible via `items` instead.
    pub keywords: Vec<String>,
}

pub struct BatchRunner<'a> {
    searcher: &'a dyn BatchSearcher,
    items: Vec<BatchItem>,
    inter_item_delay: Duration,
}

impl<'a> BatchRunner<'a> {
    /// Queues a batch from raw keyword lines: trimmed, blanks dropped,
    /// capped at [`MAX_BATCH_ITEMS`]. Lines past the cap are never
    /// dispatched.
    #[must_use]
    pub fn new(
        searcher: &'a dyn BatchSearcher,
        keyword_lines: &[String],
        inter_item_delay_ms: u64,
    ) -> Self {
        let items = keyword_lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .take(MAX_BATCH_ITEMS)
            .enumerate()
            .map(|(id, keyword)| BatchItem {
                id,
                keyword: keyword.to_owned(),
                status: BatchStatus::Pending,
                results: Vec::new(),
                error: None,
            })
            .collect();

        Self {
            searcher,
            items,
            inter_item_delay: Duration::from_millis(inter_item_delay_ms),
        }
    }

    /// The queued items, for display before the run starts.
    #[must_use]
    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// Runs the batch to completion, strictly sequentially.
    ///
    /// `on_progress` fires after each item settles (success or failure) and
    /// before the next dispatch, so an observer sees monotonically
    /// non-decreasing counts. A per-item failure is isolated to that item;
    /// the loop always reaches the end of the queue.
    pub async fn run(
        mut self,
        mut on_progress: impl FnMut(&BatchProgress, &BatchItem),
    ) -> BatchOutcome {
        let total = self.items.len();
        let mut results: Vec<ProductResult> = Vec::new();
        let mut keywords: Vec<String> = Vec::new();

        for index in 0..total {
            self.items[index].status = BatchStatus::Searching;
            let keyword = self.items[index].keyword.clone();

            match self.searcher.search_keyword(&keyword).await {
                Ok(found) => {
                    results.extend(found.iter().cloned());
                    keywords.push(keyword);
                    let item = &mut self.items[index];
                    item.status = BatchStatus::Completed;
                    item.results = found;
                }
                Err(err) => {
                    tracing::warn!(keyword = %keyword, error = %err, "batch item failed");
                    let item = &mut self.items[index];
                    item.status = BatchStatus::Error;
                    item.error = Some(err.to_string());
                }
            }

            let progress = BatchProgress {
                settled: index + 1,
                total,
                accumulated_results: results.len(),
            };
            on_progress(&progress, &self.items[index]);

            if index + 1 < total && !self.inter_item_delay.is_zero() {
                tokio::time::sleep(self.inter_item_delay).await;
            }
        }

        BatchOutcome {
            items: self.items,
            results,
            keywords,
        }
    }
}
