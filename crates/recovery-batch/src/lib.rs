//! Batch processing with bounded concurrency, per-item retry and a
//! partial-success policy.
//!
//! A [`BatchProcessor`] runs one unit operation per item. Each item is tried
//! up to `max_retries_per_item` times with exponential backoff (capped at 10
//! seconds) before it is recorded as failed. When every item has finished,
//! the batch policy in [`BatchOutcome::decide`] determines whether the batch
//! succeeded, partially succeeded, or failed:
//!
//! - **Failed** batches return [`BatchError::Failed`] with every failed item.
//! - **Partial** and **full** successes return a [`BatchResult`].
//!
//! Two execution strategies share that policy:
//!
//! - [`BatchProcessor::process`] spawns one tokio task per item and bounds
//!   concurrency with a semaphore.
//! - [`BatchProcessor::process_blocking`] runs items on a rayon worker pool
//!   sized `max_concurrent_operations`.
//!
//! A unit operation that panics counts as a failed attempt classified as
//! `unknown`.
//!
//! # Example
//!
//! ```rust
//! use recovery_batch::{BatchConfig, BatchProcessor};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let processor = BatchProcessor::new(
//!     BatchConfig::builder()
//!         .name("avatars")
//!         .max_concurrent_operations(4)
//!         .initial_backoff(Duration::from_millis(10))
//!         .build(),
//! );
//!
//! let result = processor
//!     .process(vec![1u32, 2, 3], |n| async move {
//!         Ok::<_, std::io::Error>(format!("avatar-{n}.png"))
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.successful_items, 3);
//! # }
//! ```

mod config;
mod error;
mod events;
mod item;
mod outcome;
mod stats;

pub use config::{BatchConfig, BatchConfigBuilder};
pub use error::BatchError;
pub use events::BatchEvent;
pub use item::{BatchItem, FailedItem, ItemFailure};
pub use outcome::{success_rate, BatchOutcome, BatchResult};
pub use stats::BatchStatsSnapshot;

use futures::FutureExt;
use item::AttemptFailure;
use rayon::prelude::*;
use stats::BatchStats;
use std::error::Error;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs batches under one configuration and keeps running totals.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    config: Arc<BatchConfig>,
    stats: Arc<BatchStats>,
}

impl BatchProcessor {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config: Arc::new(config),
            stats: Arc::new(BatchStats::default()),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn stats(&self) -> BatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Processes `items` on tokio tasks, at most `max_concurrent_operations`
    /// at a time. Must be called within a tokio runtime.
    pub async fn process<I, R, E, F, Fut>(
        &self,
        items: Vec<I>,
        operation: F,
    ) -> Result<BatchResult<I, R>, BatchError>
    where
        I: BatchItem + Clone + Send + 'static,
        R: Send + 'static,
        E: Error + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let started = Instant::now();
        let operation = Arc::new(operation);
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_operations));
        let mut unfinished: Vec<Option<I>> = items.iter().cloned().map(Some).collect();
        let mut tasks = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let operation = Arc::clone(&operation);
            let config = Arc::clone(&self.config);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, run_item(item, &*operation, &config).await)
            });
        }

        let mut outcomes = Vec::with_capacity(unfinished.len());
        while let Some(joined) = tasks.join_next().await {
            // panics are caught per attempt, so a join error means the task
            // was cancelled; its item is reported from `unfinished` below
            if let Ok((index, outcome)) = joined {
                unfinished[index] = None;
                outcomes.push(outcome);
            }
        }

        for item in unfinished.into_iter().flatten() {
            let failed = AttemptFailure::cancelled().into_failed(item, 0);
            item_failed(&self.config, &failed);
            outcomes.push(Err(failed));
        }

        outcome::finish(&self.config, &self.stats, outcomes, started)
    }

    /// Processes `items` on a dedicated rayon pool of
    /// `max_concurrent_operations` threads, blocking the caller until the
    /// batch is done.
    pub fn process_blocking<I, R, E, F>(
        &self,
        items: Vec<I>,
        operation: F,
    ) -> Result<BatchResult<I, R>, BatchError>
    where
        I: BatchItem + Clone + Send,
        R: Send,
        E: Error + 'static,
        F: Fn(I) -> Result<R, E> + Sync,
    {
        let started = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrent_operations)
            .thread_name(|index| format!("batch-worker-{index}"))
            .build()?;

        let config = &*self.config;
        let operation = &operation;
        let outcomes: Vec<_> = pool.install(|| {
            items
                .into_par_iter()
                .map(|item| run_item_blocking(item, operation, config))
                .collect()
        });

        outcome::finish(&self.config, &self.stats, outcomes, started)
    }
}

async fn run_item<I, R, E, F, Fut>(item: I, operation: &F, config: &BatchConfig) -> Result<R, FailedItem<I>>
where
    I: BatchItem + Clone,
    E: Error + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let attempt_item = item.clone();
        let attempted = AssertUnwindSafe(async move { operation(attempt_item).await })
            .catch_unwind()
            .await;
        let failure = match attempted {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => AttemptFailure::from_error(&error, config),
            Err(_) => AttemptFailure::panicked(),
        };

        if attempt >= config.max_retries_per_item {
            let failed = failure.into_failed(item, attempt);
            item_failed(config, &failed);
            return Err(failed);
        }

        tokio::time::sleep(item_retry(config, &item, attempt)).await;
    }
}

fn run_item_blocking<I, R, E, F>(item: I, operation: &F, config: &BatchConfig) -> Result<R, FailedItem<I>>
where
    I: BatchItem + Clone,
    E: Error + 'static,
    F: Fn(I) -> Result<R, E>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| operation(item.clone()))) {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => AttemptFailure::from_error(&error, config),
            Err(_) => AttemptFailure::panicked(),
        };

        if attempt >= config.max_retries_per_item {
            let failed = failure.into_failed(item, attempt);
            item_failed(config, &failed);
            return Err(failed);
        }

        std::thread::sleep(item_retry(config, &item, attempt));
    }
}

/// Reports a retry of `item` after failed attempt `attempt` (1-based) and
/// returns the delay before the next one.
fn item_retry<I: BatchItem>(config: &BatchConfig, item: &I, attempt: usize) -> Duration {
    let delay = config.backoff.next_interval(attempt - 1);
    config.event_listeners.emit(&BatchEvent::ItemRetry {
        name: config.name.clone(),
        timestamp: Instant::now(),
        item_id: item.item_id(),
        attempt,
        delay,
    });

    #[cfg(feature = "tracing")]
    tracing::debug!(
        batch = %config.name,
        item = %item.item_id(),
        attempt,
        delay_ms = delay.as_millis() as u64,
        "retrying batch item"
    );

    delay
}

fn item_failed<I>(config: &BatchConfig, failed: &FailedItem<I>) {
    config.event_listeners.emit(&BatchEvent::ItemFailed {
        name: config.name.clone(),
        timestamp: Instant::now(),
        item_id: failed.item_id.clone(),
        attempts: failed.attempts,
        classification: failed.classification,
    });

    #[cfg(feature = "tracing")]
    tracing::debug!(
        batch = %config.name,
        item = %failed.item_id,
        attempts = failed.attempts,
        classification = %failed.classification,
        error = %failed.error,
        "batch item failed"
    );
}
