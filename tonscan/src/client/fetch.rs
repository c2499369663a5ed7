//! Retried, failover-aware fetch helpers built on [`NodeClient`].

use std::time::Duration;

use tokio::time::timeout;

use crate::client::{AccountState, BlockData, NodeClient};
use crate::error::ClientError;
use crate::primitives::{Address, BlockRef};
use crate::retry::Retrier;

/// Fetches a shard block's data, rotating to the next node before every
/// attempt and bounding each attempt with `attempt_timeout`.
pub(crate) async fn fetch_shard_block<C>(
    client: &C,
    retrier: &Retrier,
    master: &BlockRef,
    shard: &BlockRef,
    attempt_timeout: Duration,
) -> Result<BlockData, ClientError>
where
    C: NodeClient + ?Sized,
{
    retrier
        .wrap("fetch block", move || async move {
            if let Err(err) = client.rotate_node().await {
                tracing::debug!(
                    master = master.seqno(),
                    shard = shard.shard(),
                    %err,
                    "pick next node"
                );
                return Err(err);
            }

            match timeout(attempt_timeout, client.wait_block_data(master.seqno(), shard)).await {
                Ok(Ok(block)) => Ok(block),
                Ok(Err(err)) => {
                    tracing::debug!(
                        master = master.seqno(),
                        shard = shard.shard(),
                        %err,
                        "get block"
                    );
                    Err(err)
                }
                Err(_) => Err(ClientError::Timeout(attempt_timeout)),
            }
        })
        .await
}

/// The verifier's account fetch: up to `attempts` tries against rotating
/// nodes, each bounded by `attempt_timeout`, with a fixed delay between
/// failed tries. Returns `None` when no state could be obtained, including
/// when rotation itself fails.
pub(crate) async fn fetch_account_state<C>(
    client: &C,
    account: &Address,
    master: &BlockRef,
    attempts: u32,
    attempt_timeout: Duration,
    retry_delay: Duration,
) -> Option<AccountState>
where
    C: NodeClient + ?Sized,
{
    for _ in 0..attempts {
        if let Err(err) = client.rotate_node().await {
            tracing::debug!(%account, %err, "failed to pick next node");
            break;
        }

        match timeout(
            attempt_timeout,
            client.wait_account_state(master.seqno(), master, account),
        )
        .await
        {
            Ok(Ok(state)) => return state,
            Ok(Err(err)) => {
                tracing::debug!(%account, %err, "failed to get account");
            }
            Err(_) => {
                tracing::debug!(%account, timeout = ?attempt_timeout, "failed to get account");
            }
        }

        tokio::time::sleep(retry_delay).await;
    }

    None
}
