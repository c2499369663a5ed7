//! Scan engine configuration.
//!
//! All knobs are injected at construction; the engine reads no globals.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Configuration consumed by [`crate::sync::run`].
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Number of verifier workers draining the account fetch queue.
    pub num_workers: usize,
    /// Maximum master blocks pulled per cycle.
    pub batch_cap: u32,
    /// Capacity of the shared account fetch queue. Enqueueing blocks when
    /// full, back-pressuring the whole pipeline.
    pub task_queue_size: usize,
    /// Attempts to fetch an account state before the task is dropped.
    pub verify_attempts: u32,
    /// Per-attempt timeout for account state fetches.
    pub verify_timeout: Duration,
    /// Delay between failed account state attempts.
    pub verify_retry_delay: Duration,
    /// Per-attempt timeout when fetching shard block data.
    pub block_fetch_timeout: Duration,
    /// Master-block lag above which the scanner is out of sync.
    pub out_of_sync_after: u32,
    /// Lag at or below which an out-of-sync scanner counts as resynced.
    pub resync_below: u32,
    /// Sleep between unsuccessful chain tip polls and failed lookups.
    pub poll_interval: Duration,
    /// The only workchain whose shards are followed.
    pub tracked_workchain: i32,
    /// Backoff schedule for retried node calls.
    pub retry: RetryPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            num_workers: 10,
            batch_cap: 100,
            task_queue_size: 100,
            verify_attempts: 20,
            verify_timeout: Duration::from_secs(3),
            verify_retry_delay: Duration::from_millis(100),
            block_fetch_timeout: Duration::from_secs(20),
            out_of_sync_after: 60,
            resync_below: 1,
            poll_interval: Duration::from_millis(100),
            tracked_workchain: 0,
            retry: RetryPolicy::default(),
        }
    }
}
