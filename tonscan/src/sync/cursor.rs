//! Advancing the pointer into the master block sequence.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::client::NodeClient;
use crate::config::ScanConfig;
use crate::primitives::{BlockRef, CycleStats, MasterBatch};
use crate::sync::lag::SyncLagReporter;
use crate::utils::interruptible_sleep;

/// Polls the chain tip and produces the master blocks for the next cycle.
pub struct MasterchainCursor<C> {
    client: Arc<C>,
    batch_cap: u32,
    poll_interval: Duration,
}

impl<C> MasterchainCursor<C>
where
    C: NodeClient,
{
    /// Creates a cursor over `client` with the configured batch cap.
    pub fn new(client: Arc<C>, config: &ScanConfig) -> Self {
        Self {
            client,
            batch_cap: config.batch_cap,
            poll_interval: config.poll_interval,
        }
    }

    /// Polls until the tip advances past `last`, reports the lag to
    /// `reporter` and returns the refs of the next batch, capped at the
    /// batch cap. Every lookup is retried individually until it succeeds.
    ///
    /// Returns `None` on shutdown.
    pub async fn next_batch(
        &self,
        last: &BlockRef,
        stats: &CycleStats,
        reporter: &mut SyncLagReporter,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<MasterBatch> {
        loop {
            if *shutdown.borrow() {
                return None;
            }

            let tip = tokio::select! {
                _ = shutdown.changed() => return None,
                tip = self.client.wait_masterchain_info(last.seqno() + 1) => tip,
            };
            let tip = match tip {
                Ok(tip) => tip,
                Err(err) => {
                    tracing::debug!(seqno = last.seqno() + 1, %err, "failed to get last block");
                    if !interruptible_sleep(self.poll_interval, shutdown).await {
                        return None;
                    }
                    continue;
                }
            };

            if tip.seqno() <= last.seqno() {
                if !interruptible_sleep(self.poll_interval, shutdown).await {
                    return None;
                }
                continue;
            }

            let lag = tip.seqno() - last.seqno();
            reporter.observe(lag, stats);

            // Bounds memory and keeps every cycle finite regardless of how
            // far behind the scanner fell.
            let take = lag.min(self.batch_cap);
            let mut batch = Vec::with_capacity(take as usize);
            for seqno in last.seqno() + 1..=last.seqno() + take {
                batch.push(self.lookup_until(last, seqno, shutdown).await?);
            }
            return Some(batch);
        }
    }

    async fn lookup_until(
        &self,
        last: &BlockRef,
        seqno: u32,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<BlockRef> {
        loop {
            let result = tokio::select! {
                _ = shutdown.changed() => return None,
                result = self
                    .client
                    .wait_lookup_block(seqno, last.workchain(), last.shard(), seqno) => result,
            };
            match result {
                Ok(block) => return Some(block),
                Err(err) => {
                    tracing::debug!(seqno, %err, "failed to get next block");
                    if !interruptible_sleep(self.poll_interval, shutdown).await {
                        return None;
                    }
                }
            }
        }
    }
}
