//! Mock node client with scriptable failures.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tonscan::client::{AccountState, BlockData, NodeClient};
use tonscan::error::ClientError;
use tonscan::primitives::{Address, BlockRef};

use crate::chain::MockChain;

/// A [`NodeClient`] serving a [`MockChain`], counting node rotations and
/// failing on demand.
#[derive(Debug, Default)]
pub struct MockNode {
    chain: Mutex<MockChain>,
    rotations: AtomicU32,
    masterchain_info_calls: AtomicU32,
    fail_masterchain_info: AtomicU32,
    fail_block_data: AtomicU32,
    fail_account_state: AtomicU32,
}

impl MockNode {
    /// Creates a node serving `chain`.
    pub fn new(chain: MockChain) -> Self {
        Self {
            chain: Mutex::new(chain),
            ..Self::default()
        }
    }

    /// Locks the chain for inspection or mutation mid-test.
    pub fn chain(&self) -> MutexGuard<'_, MockChain> {
        self.chain.lock().unwrap()
    }

    /// How many times the engine rotated to another node.
    pub fn rotations(&self) -> u32 {
        self.rotations.load(Ordering::SeqCst)
    }

    /// How many masterchain info calls the engine has made, failed attempts
    /// included. Non-zero once the engine has taken its startup snapshot.
    pub fn masterchain_info_calls(&self) -> u32 {
        self.masterchain_info_calls.load(Ordering::SeqCst)
    }

    /// Fails the next `n` masterchain info calls, waits included.
    pub fn fail_next_masterchain_info(&self, n: u32) {
        self.fail_masterchain_info.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` block data fetches, waits included.
    pub fn fail_next_block_data(&self, n: u32) {
        self.fail_block_data.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` account state fetches.
    pub fn fail_next_account_states(&self, n: u32) {
        self.fail_account_state.store(n, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn masterchain_info(&self) -> Result<BlockRef, ClientError> {
        self.masterchain_info_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_masterchain_info) {
            return Err(ClientError::Transport("injected failure".into()));
        }
        self.chain()
            .tip()
            .ok_or_else(|| ClientError::NodeUnavailable("empty chain".into()))
    }

    async fn wait_masterchain_info(&self, min_seqno: u32) -> Result<BlockRef, ClientError> {
        let tip = self.masterchain_info().await?;
        if tip.seqno() < min_seqno {
            return Err(ClientError::Timeout(Duration::from_millis(10)));
        }
        Ok(tip)
    }

    async fn wait_lookup_block(
        &self,
        _min_seqno: u32,
        workchain: i32,
        shard: i64,
        seqno: u32,
    ) -> Result<BlockRef, ClientError> {
        self.chain().lookup(workchain, shard, seqno).ok_or_else(|| {
            ClientError::BlockNotFound(BlockRef::from_parts(
                workchain,
                shard,
                seqno,
                [0; 32],
                [0; 32],
            ))
        })
    }

    async fn block_shards(&self, master: &BlockRef) -> Result<Vec<BlockRef>, ClientError> {
        self.chain()
            .shard_tips(master)
            .ok_or(ClientError::BlockNotFound(*master))
    }

    async fn block_data(&self, block: &BlockRef) -> Result<BlockData, ClientError> {
        if Self::take_failure(&self.fail_block_data) {
            return Err(ClientError::Transport("injected failure".into()));
        }
        self.chain()
            .block(block)
            .ok_or(ClientError::BlockNotFound(*block))
    }

    async fn wait_block_data(
        &self,
        _min_seqno: u32,
        block: &BlockRef,
    ) -> Result<BlockData, ClientError> {
        self.block_data(block).await
    }

    async fn wait_account_state(
        &self,
        _min_seqno: u32,
        _master: &BlockRef,
        account: &Address,
    ) -> Result<Option<AccountState>, ClientError> {
        if Self::take_failure(&self.fail_account_state) {
            return Err(ClientError::Transport("injected failure".into()));
        }
        Ok(self.chain().account_state(account))
    }

    async fn rotate_node(&self) -> Result<(), ClientError> {
        self.rotations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
