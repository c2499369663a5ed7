//! Extraction of account transactions from fetched shard blocks.

use tokio::sync::{mpsc, oneshot};

use crate::client::{fetch, BlockData, NodeClient};
use crate::config::ScanConfig;
use crate::primitives::{Address, BlockRef, ScanCounters, TransactionSkeleton};
use crate::retry::Retrier;
use crate::scan::error::ParseError;
use crate::scan::task::FetchTask;

/// Fetches one shard block, samples one transaction per touched account into
/// the task queue and waits until every spawned task has completed.
///
/// Fetch and parse failures abandon this shard only; the cycle continues
/// with the next shard.
pub(crate) async fn scan_shard<C>(
    client: &C,
    retrier: &Retrier,
    config: &ScanConfig,
    master: BlockRef,
    shard: BlockRef,
    task_sender: &mpsc::Sender<FetchTask>,
    counters: &ScanCounters,
) where
    C: NodeClient + ?Sized,
{
    tracing::debug!(
        shard = shard.shard(),
        workchain = shard.workchain(),
        "scanning shard"
    );

    let block = match fetch::fetch_shard_block(
        client,
        retrier,
        &master,
        &shard,
        config.block_fetch_timeout,
    )
    .await
    {
        Ok(block) => block,
        Err(err) => {
            tracing::warn!(
                master = master.seqno(),
                shard = shard.shard(),
                %err,
                "failed to fetch shard block, skipping"
            );
            return;
        }
    };

    let pending = match enqueue_account_tasks(&block, master, shard, task_sender, counters).await {
        Ok(pending) => pending,
        Err(err) => {
            tracing::error!(
                seqno = shard.seqno(),
                shard = shard.shard(),
                workchain = shard.workchain(),
                %err,
                "failed to parse block, skipping. Fix issue and rescan later"
            );
            return;
        }
    };

    // The shard is done only once every task has been accepted or dropped.
    // A dropped sender resolves the receiver too, so a worker can never
    // leave this barrier hanging.
    for done in pending {
        let _ = done.await;
    }
}

/// Walks the block's account dictionary in natural order, enqueueing a task
/// for the first transaction recorded for each touched account.
///
/// Sampling one transaction per account per block is the engine's
/// downsampling policy; the counters still count every transaction seen.
async fn enqueue_account_tasks(
    block: &BlockData,
    master: BlockRef,
    shard: BlockRef,
    task_sender: &mpsc::Sender<FetchTask>,
    counters: &ScanCounters,
) -> Result<Vec<oneshot::Receiver<()>>, ParseError> {
    let mut pending = Vec::new();

    for account_block in &block.account_blocks {
        let hash: [u8; 32] =
            account_block
                .account
                .as_slice()
                .try_into()
                .map_err(|_| ParseError::AccountKey {
                    block: shard,
                    len: account_block.account.len(),
                })?;
        let account = Address::from_parts(shard.workchain() as i8, hash);

        counters.add_transactions(account_block.transactions.len() as u64);

        let raw = match account_block.transactions.first() {
            Some(raw) => raw,
            None => continue,
        };
        let tx_hash: [u8; 32] =
            raw.hash
                .as_slice()
                .try_into()
                .map_err(|_| ParseError::TransactionHash {
                    account,
                    len: raw.hash.len(),
                })?;

        let skeleton = TransactionSkeleton::from_parts(
            account,
            tx_hash,
            raw.logical_time,
            raw.unix_time,
            master,
            shard,
            raw.data.clone(),
        );
        let (done, done_receiver) = oneshot::channel();
        let task = FetchTask::new(master, shard, account, skeleton, done);

        // Blocks when the queue is full; backpressure on the whole pipeline.
        // A closed queue means the engine is shutting down.
        if task_sender.send(task).await.is_err() {
            break;
        }
        pending.push(done_receiver);
    }

    tracing::debug!(
        seqno = shard.seqno(),
        shard = shard.shard(),
        workchain = shard.workchain(),
        affected_accounts = block.account_blocks.len(),
        transactions = counters.transactions(),
        "scanning transactions"
    );

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AccountBlock, RawTransaction};

    fn shard_ref(seqno: u32) -> BlockRef {
        BlockRef::from_parts(0, 0x4000000000000000u64 as i64, seqno, [3; 32], [4; 32])
    }

    fn master_ref(seqno: u32) -> BlockRef {
        BlockRef::from_parts(-1, i64::MIN, seqno, [1; 32], [2; 32])
    }

    fn raw_transaction(tag: u8, logical_time: u64) -> RawTransaction {
        RawTransaction {
            hash: vec![tag; 32],
            logical_time,
            unix_time: 1_700_000_000,
            data: vec![tag, tag, tag],
        }
    }

    #[tokio::test]
    async fn samples_first_transaction_per_account() {
        let block = BlockData {
            prev: vec![],
            account_blocks: vec![
                AccountBlock {
                    account: vec![0xaa; 32],
                    transactions: vec![
                        raw_transaction(1, 100),
                        raw_transaction(2, 101),
                        raw_transaction(3, 102),
                    ],
                },
                AccountBlock {
                    account: vec![0xbb; 32],
                    transactions: vec![raw_transaction(4, 200)],
                },
            ],
        };

        let (sender, mut receiver) = mpsc::channel(10);
        let counters = ScanCounters::new();
        let pending =
            enqueue_account_tasks(&block, master_ref(10), shard_ref(5), &sender, &counters)
                .await
                .unwrap();

        assert_eq!(pending.len(), 2);
        assert_eq!(counters.transactions(), 4);

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.transaction().hash(), [1; 32]);
        assert_eq!(first.transaction().logical_time(), 100);
        assert_eq!(first.account(), Address::from_parts(0, [0xaa; 32]));

        let second = receiver.recv().await.unwrap();
        assert_eq!(second.transaction().hash(), [4; 32]);
        assert_eq!(second.account(), Address::from_parts(0, [0xbb; 32]));
    }

    #[tokio::test]
    async fn accounts_without_transactions_are_skipped() {
        let block = BlockData {
            prev: vec![],
            account_blocks: vec![AccountBlock {
                account: vec![0xaa; 32],
                transactions: vec![],
            }],
        };

        let (sender, _receiver) = mpsc::channel(10);
        let counters = ScanCounters::new();
        let pending =
            enqueue_account_tasks(&block, master_ref(10), shard_ref(5), &sender, &counters)
                .await
                .unwrap();

        assert!(pending.is_empty());
        assert_eq!(counters.transactions(), 0);
    }

    #[tokio::test]
    async fn malformed_account_key_aborts_extraction() {
        let block = BlockData {
            prev: vec![],
            account_blocks: vec![AccountBlock {
                account: vec![0xaa; 31],
                transactions: vec![raw_transaction(1, 100)],
            }],
        };

        let (sender, _receiver) = mpsc::channel(10);
        let counters = ScanCounters::new();
        let result =
            enqueue_account_tasks(&block, master_ref(10), shard_ref(5), &sender, &counters).await;

        assert!(matches!(result, Err(ParseError::AccountKey { len: 31, .. })));
    }

    #[tokio::test]
    async fn malformed_transaction_hash_aborts_extraction() {
        let block = BlockData {
            prev: vec![],
            account_blocks: vec![AccountBlock {
                account: vec![0xaa; 32],
                transactions: vec![RawTransaction {
                    hash: vec![1; 16],
                    ..RawTransaction::default()
                }],
            }],
        };

        let (sender, _receiver) = mpsc::channel(10);
        let counters = ScanCounters::new();
        let result =
            enqueue_account_tasks(&block, master_ref(10), shard_ref(5), &sender, &counters).await;

        assert!(matches!(
            result,
            Err(ParseError::TransactionHash { len: 16, .. })
        ));
    }
}
