//! Account fetch tasks and the verifier worker pool.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

use crate::client::{fetch, AccountStatus, NodeClient};
use crate::config::ScanConfig;
use crate::primitives::{Address, BlockRef, ScanEvent, TransactionSkeleton};

/// One account verification unit: created by the extractor, consumed exactly
/// once by a verifier worker.
///
/// `done` resolves the extractor's completion barrier. Sending consumes the
/// channel, so a task can signal at most once; dropping the task unresolved
/// releases the barrier as well, so a task can never be silently lost.
#[derive(Debug)]
pub struct FetchTask {
    master: BlockRef,
    shard: BlockRef,
    account: Address,
    transaction: TransactionSkeleton,
    done: oneshot::Sender<()>,
}

impl FetchTask {
    /// Creates a task. The receiver half of `done` resolves when the task
    /// has been accepted and forwarded, or dropped.
    pub fn new(
        master: BlockRef,
        shard: BlockRef,
        account: Address,
        transaction: TransactionSkeleton,
        done: oneshot::Sender<()>,
    ) -> Self {
        Self {
            master,
            shard,
            account,
            transaction,
            done,
        }
    }

    /// Master block the owning shard was discovered under.
    pub fn master(&self) -> BlockRef {
        self.master
    }

    /// Shard block the transaction was extracted from.
    pub fn shard(&self) -> BlockRef {
        self.shard
    }

    /// Account touched by the transaction.
    pub fn account(&self) -> Address {
        self.account
    }

    /// The sampled transaction.
    pub fn transaction(&self) -> &TransactionSkeleton {
        &self.transaction
    }
}

/// Fixed-size pool of workers confirming that each candidate account is
/// still active before its transaction is forwarded to the output channel.
///
/// All workers drain one shared bounded queue; they exit when the queue
/// closes or the shutdown flag fires.
pub struct VerifierPool {
    workers: Vec<JoinHandle<()>>,
}

impl VerifierPool {
    /// Spawns `config.num_workers` workers draining `task_receiver`.
    pub fn spawn<C>(
        client: Arc<C>,
        config: &ScanConfig,
        task_receiver: mpsc::Receiver<FetchTask>,
        output: mpsc::Sender<ScanEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self
    where
        C: NodeClient,
    {
        let receiver = Arc::new(Mutex::new(task_receiver));
        let mut workers = Vec::with_capacity(config.num_workers);
        for _ in 0..config.num_workers {
            workers.push(tokio::spawn(worker(
                client.clone(),
                config.clone(),
                receiver.clone(),
                output.clone(),
                shutdown.clone(),
            )));
        }
        Self { workers }
    }

    /// Waits for every worker to exit. Quiescence: once this returns, no
    /// task is in flight and none will be picked up.
    pub async fn join(self) {
        for handle in self.workers {
            let _ = handle.await;
        }
    }
}

async fn worker<C>(
    client: Arc<C>,
    config: ScanConfig,
    receiver: Arc<Mutex<mpsc::Receiver<FetchTask>>>,
    output: mpsc::Sender<ScanEvent>,
    mut shutdown: watch::Receiver<bool>,
) where
    C: NodeClient,
{
    loop {
        let task = {
            let mut receiver = receiver.lock().await;
            tokio::select! {
                _ = shutdown.changed() => return,
                task = receiver.recv() => match task {
                    Some(task) => task,
                    None => return,
                },
            }
        };

        verify(client.as_ref(), &config, task, &output, &mut shutdown).await;
    }
}

/// Fetches the account's state as of the task's master block and forwards
/// the transaction when the account is confirmed active. Signals completion
/// exactly once whatever the outcome.
async fn verify<C>(
    client: &C,
    config: &ScanConfig,
    task: FetchTask,
    output: &mpsc::Sender<ScanEvent>,
    shutdown: &mut watch::Receiver<bool>,
) where
    C: NodeClient + ?Sized,
{
    let FetchTask {
        master,
        shard: _,
        account,
        transaction,
        done,
    } = task;

    let state = fetch::fetch_account_state(
        client,
        &account,
        &master,
        config.verify_attempts,
        config.verify_timeout,
        config.verify_retry_delay,
    )
    .await;

    let forward = matches!(
        &state,
        Some(state) if state.active && state.status == AccountStatus::Active
    );
    if forward {
        tokio::select! {
            _ = shutdown.changed() => {}
            _ = output.send(ScanEvent::Transaction(transaction)) => {}
        }
    }

    let _ = done.send(());
}
