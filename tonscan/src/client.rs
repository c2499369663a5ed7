//! Node boundary: the client trait the engine drives and the wire types it
//! returns.
//!
//! The engine owns no transport. A concrete implementation (a lite server
//! connection pool, a proxy, a test double) is injected at startup and every
//! call is assumed fallible; retry and failover policy live in the engine,
//! not the client.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::primitives::{Address, BlockRef};

pub mod fetch;

/// Connection to the chain, as the engine sees it.
///
/// The `wait_` methods are served by a node that has applied masterchain
/// block `min_seqno`; they may fail with [`ClientError::Timeout`] when the
/// node does not reach that seqno in time. [`NodeClient::rotate_node`]
/// switches the underlying connection to the next node in the pool and is
/// called before failover-sensitive attempts.
#[async_trait]
pub trait NodeClient: Send + Sync + 'static {
    /// Current masterchain tip.
    async fn masterchain_info(&self) -> Result<BlockRef, ClientError>;

    /// Masterchain tip, from a node synced to at least `min_seqno`.
    async fn wait_masterchain_info(&self, min_seqno: u32) -> Result<BlockRef, ClientError>;

    /// Full block reference for the block at the given position.
    async fn wait_lookup_block(
        &self,
        min_seqno: u32,
        workchain: i32,
        shard: i64,
        seqno: u32,
    ) -> Result<BlockRef, ClientError>;

    /// Shard tips referenced by a master block.
    async fn block_shards(&self, master: &BlockRef) -> Result<Vec<BlockRef>, ClientError>;

    /// Header and account dictionary of a block.
    async fn block_data(&self, block: &BlockRef) -> Result<BlockData, ClientError>;

    /// Same as [`NodeClient::block_data`], from a node synced to `min_seqno`.
    async fn wait_block_data(
        &self,
        min_seqno: u32,
        block: &BlockRef,
    ) -> Result<BlockData, ClientError>;

    /// State of `account` as of `master`. `None` when the chain has no such
    /// account.
    async fn wait_account_state(
        &self,
        min_seqno: u32,
        master: &BlockRef,
        account: &Address,
    ) -> Result<Option<AccountState>, ClientError>;

    /// Switches the underlying connection to the next node in the pool.
    async fn rotate_node(&self) -> Result<(), ClientError>;
}

/// A fetched block: parent references from the header plus the per-account
/// transaction dictionary.
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    /// Parent block references. Two entries at a shard merge.
    pub prev: Vec<BlockRef>,
    /// One entry per account touched by this block, in dictionary order.
    pub account_blocks: Vec<AccountBlock>,
}

/// The transactions recorded for one touched account in one block.
#[derive(Debug, Clone, Default)]
pub struct AccountBlock {
    /// 256-bit account id within the block's workchain. Length is validated
    /// when the block is parsed.
    pub account: Vec<u8>,
    /// Transactions in dictionary order.
    pub transactions: Vec<RawTransaction>,
}

/// A transaction as returned by the node, undecoded.
#[derive(Debug, Clone, Default)]
pub struct RawTransaction {
    /// Transaction hash. Length is validated when the block is parsed.
    pub hash: Vec<u8>,
    /// Logical time of the transaction.
    pub logical_time: u64,
    /// Unix timestamp of the transaction.
    pub unix_time: u32,
    /// Raw transaction payload.
    pub data: Vec<u8>,
}

/// On-chain state of a single account.
#[derive(Debug, Clone, Copy)]
pub struct AccountState {
    /// Whether the account is deployed and live.
    pub active: bool,
    /// Status reported by the node.
    pub status: AccountStatus,
    /// Balance in nanotokens.
    pub balance: u64,
    /// Logical time of the account's last transaction.
    pub last_transaction_lt: u64,
}

/// Account status as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    /// The address holds funds but no deployed contract.
    Uninit,
    /// The account has a deployed, running contract.
    Active,
    /// The contract was frozen for non-payment of storage fees.
    Frozen,
    /// The chain has never seen the address.
    Nonexist,
}
