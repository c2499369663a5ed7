//! Entrypoint for the scan engine.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};

use crate::client::NodeClient;
use crate::config::ScanConfig;
use crate::error::SyncError;
use crate::primitives::{CycleStats, ScanCounters, ScanEvent};
use crate::retry::Retrier;
use crate::scan;
use crate::scan::task::VerifierPool;

pub mod cursor;
pub mod lag;

use cursor::MasterchainCursor;
use lag::SyncLagReporter;

/// Continuously scans the chain, streaming verified transactions to
/// `output` until `shutdown` fires.
///
/// Only the initial masterchain lookup can fail; every later error is
/// recovered locally (retried, or the affected shard/account dropped).
/// On shutdown the cycle unwinds, the task queue drains and the verifier
/// pool is joined before returning.
pub async fn run<C>(
    client: Arc<C>,
    config: ScanConfig,
    output: mpsc::Sender<ScanEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), SyncError>
where
    C: NodeClient,
{
    let master = client
        .masterchain_info()
        .await
        .map_err(SyncError::MasterchainInfo)?;
    tracing::debug!(seqno = master.seqno(), "starting scanner");

    let (task_sender, task_receiver) = mpsc::channel(config.task_queue_size);
    let pool = VerifierPool::spawn(
        client.clone(),
        &config,
        task_receiver,
        output,
        shutdown.clone(),
    );

    let cursor = MasterchainCursor::new(client.clone(), &config);
    let mut reporter = SyncLagReporter::new(&config);
    let retrier = Arc::new(Retrier::new(config.retry.clone()));
    let counters = Arc::new(ScanCounters::new());

    let mut masters = vec![master];
    loop {
        let started = Instant::now();
        counters.reset();

        // Masters are discovered and resolved in increasing seqno order;
        // extraction fans out one task per newly-discovered shard.
        let mut interrupted = false;
        let mut extractions = FuturesUnordered::new();
        for master in &masters {
            let new_shards =
                match scan::discover_new_shards(client.as_ref(), &config, master, &mut shutdown)
                    .await
                {
                    Some(new_shards) => new_shards,
                    None => {
                        interrupted = true;
                        break;
                    }
                };
            counters.add_shard_blocks(new_shards.len() as u64);

            for shard in new_shards {
                let client = client.clone();
                let retrier = retrier.clone();
                let config = config.clone();
                let task_sender = task_sender.clone();
                let counters = counters.clone();
                let master = *master;
                extractions.push(tokio::spawn(async move {
                    scan::scan_shard(
                        client.as_ref(),
                        &retrier,
                        &config,
                        master,
                        shard,
                        &task_sender,
                        &counters,
                    )
                    .await;
                }));
            }
        }

        // Cycle barrier: every shard's fan-out must drain before the next
        // batch is discovered, even when shutting down mid-batch.
        while let Some(result) = extractions.next().await {
            if let Err(err) = result {
                tracing::error!(%err, "shard scan task failed");
            }
        }
        if interrupted || *shutdown.borrow() {
            break;
        }

        let last = match masters.last() {
            Some(last) => *last,
            None => break,
        };
        let took = started.elapsed();
        tracing::debug!(seqno = last.seqno(), ?took, "scanned master");

        let stats = CycleStats::from_parts(
            took,
            masters.len(),
            counters.transactions(),
            counters.shard_blocks(),
        );
        match cursor
            .next_batch(&last, &stats, &mut reporter, &mut shutdown)
            .await
        {
            Some(batch) => masters = batch,
            None => break,
        }
    }

    // Closing the queue lets the workers drain what is left and exit; join
    // only returns once no task is in flight.
    drop(task_sender);
    pool.join().await;

    Ok(())
}
