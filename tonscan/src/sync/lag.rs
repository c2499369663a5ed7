//! Synchronization health derived from master-block lag.

use crate::config::ScanConfig;
use crate::primitives::{CycleStats, SyncStatus};

/// Classifies the per-cycle lag and logs state transitions.
///
/// An out-of-sync episode is sticky: it only clears once the lag drops to
/// the resync threshold, not when it merely falls below the out-of-sync
/// threshold.
pub struct SyncLagReporter {
    out_of_sync_after: u32,
    resync_below: u32,
    status: SyncStatus,
}

impl SyncLagReporter {
    /// Creates a reporter with the configured thresholds, starting synced.
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            out_of_sync_after: config.out_of_sync_after,
            resync_below: config.resync_below,
            status: SyncStatus::Synced,
        }
    }

    /// Current status as of the last observed cycle.
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Classifies `lag`, logging transitions and the per-cycle throughput
    /// summary. Steady state produces no logs above debug level.
    pub fn observe(&mut self, lag: u32, stats: &CycleStats) -> SyncStatus {
        let next = self.classify(lag);

        if next != self.status {
            match next {
                SyncStatus::OutOfSync => {
                    tracing::warn!(
                        lag_master_blocks = lag,
                        processed_master_blocks = stats.masters(),
                        processed_shard_blocks = stats.shard_blocks(),
                        processed_transactions = stats.transactions(),
                        took_ms_per_block = ?stats.avg_block_time(),
                        "chain scanner is out of sync"
                    );
                }
                SyncStatus::Synced if self.status == SyncStatus::OutOfSync => {
                    tracing::info!("chain scanner is synchronized");
                }
                _ => {
                    tracing::debug!(
                        status = %next,
                        previous = %self.status,
                        lag_master_blocks = lag,
                        "sync status changed"
                    );
                }
            }
            self.status = next;
        }

        tracing::debug!(
            lag_master_blocks = lag,
            processed_transactions = stats.transactions(),
            "scanner delay"
        );

        next
    }

    fn classify(&self, lag: u32) -> SyncStatus {
        if lag > self.out_of_sync_after {
            SyncStatus::OutOfSync
        } else if lag <= self.resync_below {
            SyncStatus::Synced
        } else if self.status == SyncStatus::OutOfSync {
            SyncStatus::OutOfSync
        } else {
            SyncStatus::CatchingUp
        }
    }
}
