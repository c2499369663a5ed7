//! Master block scanning: shard discovery and extraction.

use std::time::Instant;

use tokio::sync::watch;

use crate::client::NodeClient;
use crate::config::ScanConfig;
use crate::primitives::{BlockRef, ShardSet};
use crate::utils::interruptible_sleep;

pub mod error;
pub mod frontier;
pub mod task;
pub(crate) mod transactions;

pub(crate) use transactions::scan_shard;

/// Discovers the shard blocks introduced by `master` relative to its
/// predecessor, retrying every step until it succeeds or shutdown fires.
///
/// Returns `None` on shutdown.
pub(crate) async fn discover_new_shards<C>(
    client: &C,
    config: &ScanConfig,
    master: &BlockRef,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<Vec<BlockRef>>
where
    C: NodeClient + ?Sized,
{
    tracing::debug!(seqno = master.seqno(), "scanning master");

    let started = Instant::now();
    let prev_seqno = master.seqno().saturating_sub(1);
    loop {
        if *shutdown.borrow() {
            return None;
        }

        let prev_master = match client
            .wait_lookup_block(prev_seqno, master.workchain(), master.shard(), prev_seqno)
            .await
        {
            Ok(block) => block,
            Err(err) => {
                tracing::debug!(seqno = prev_seqno, %err, "failed to get prev master block");
                if !interruptible_sleep(config.poll_interval, shutdown).await {
                    return None;
                }
                continue;
            }
        };

        let prev_shards: ShardSet = match client.block_shards(&prev_master).await {
            Ok(shards) => shards.into_iter().collect(),
            Err(err) => {
                tracing::debug!(master = master.seqno(), %err, "failed to get shards on block");
                if !interruptible_sleep(config.poll_interval, shutdown).await {
                    return None;
                }
                continue;
            }
        };

        let current_shards = match client.block_shards(master).await {
            Ok(shards) => shards,
            Err(err) => {
                tracing::debug!(master = master.seqno(), %err, "failed to get shards on block");
                if !interruptible_sleep(config.poll_interval, shutdown).await {
                    return None;
                }
                continue;
            }
        };

        tracing::debug!(
            seqno = master.seqno(),
            took = ?started.elapsed(),
            "shards fetched"
        );

        match frontier::not_seen_shards(
            client,
            &current_shards,
            &prev_shards,
            config.tracked_workchain,
        )
        .await
        {
            Ok(new_shards) => return Some(new_shards),
            Err(err) => {
                tracing::debug!(master = master.seqno(), %err, "get not seen shards on block");
                if !interruptible_sleep(config.poll_interval, shutdown).await {
                    return None;
                }
            }
        }
    }
}
