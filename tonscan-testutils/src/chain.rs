//! In-memory chain graph used to drive the engine in tests.

use std::collections::{BTreeMap, HashMap};

use tonscan::client::{AccountBlock, AccountState, AccountStatus, BlockData, RawTransaction};
use tonscan::primitives::{Address, BlockRef};

/// Workchain of the masterchain.
pub const MASTERCHAIN: i32 = -1;
/// Shard id of the masterchain.
pub const MASTER_SHARD: i64 = i64::MIN;
/// The workchain the scanner follows.
pub const BASECHAIN: i32 = 0;

/// Deterministic 32-byte filler derived from block coordinates, so that the
/// same coordinates always produce the same ref.
pub fn test_hash(tag: u8, shard: i64, seqno: u32) -> [u8; 32] {
    let mut hash = [0u8; 32];
    hash[0] = tag;
    hash[1..9].copy_from_slice(&shard.to_be_bytes());
    hash[9..13].copy_from_slice(&seqno.to_be_bytes());
    hash
}

/// Reference for the master block at `seqno`.
pub fn master_ref(seqno: u32) -> BlockRef {
    BlockRef::from_parts(
        MASTERCHAIN,
        MASTER_SHARD,
        seqno,
        test_hash(1, MASTER_SHARD, seqno),
        test_hash(2, MASTER_SHARD, seqno),
    )
}

/// Reference for the basechain shard block at (`shard`, `seqno`).
pub fn shard_ref(shard: i64, seqno: u32) -> BlockRef {
    BlockRef::from_parts(
        BASECHAIN,
        shard,
        seqno,
        test_hash(3, shard, seqno),
        test_hash(4, shard, seqno),
    )
}

/// A basechain address with a filler hash.
pub fn account(tag: u8) -> Address {
    Address::from_parts(0, [tag; 32])
}

/// A raw transaction with a filler hash derived from `logical_time`.
pub fn transaction(logical_time: u64) -> RawTransaction {
    let mut hash = [0u8; 32];
    hash[..8].copy_from_slice(&logical_time.to_be_bytes());
    RawTransaction {
        hash: hash.to_vec(),
        logical_time,
        unix_time: 1_700_000_000,
        data: logical_time.to_be_bytes().to_vec(),
    }
}

/// An account dictionary entry with a single transaction.
pub fn single_tx_account_block(account: Address, logical_time: u64) -> AccountBlock {
    AccountBlock {
        account: account.hash().to_vec(),
        transactions: vec![transaction(logical_time)],
    }
}

/// State of a healthy deployed account.
pub fn active_state() -> AccountState {
    AccountState {
        active: true,
        status: AccountStatus::Active,
        balance: 1_000_000_000,
        last_transaction_lt: 1,
    }
}

/// State of a frozen account: live but not `Active`.
pub fn frozen_state() -> AccountState {
    AccountState {
        active: true,
        status: AccountStatus::Frozen,
        balance: 0,
        last_transaction_lt: 1,
    }
}

/// State of an address that has never deployed a contract.
pub fn uninit_state() -> AccountState {
    AccountState {
        active: false,
        status: AccountStatus::Uninit,
        balance: 0,
        last_transaction_lt: 0,
    }
}

/// A programmable master/shard block graph with account states.
#[derive(Debug, Default)]
pub struct MockChain {
    masters: BTreeMap<u32, BlockRef>,
    shards: HashMap<BlockRef, Vec<BlockRef>>,
    blocks: HashMap<BlockRef, BlockData>,
    accounts: HashMap<Address, Option<AccountState>>,
}

impl MockChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the master block at `seqno` with the given shard tips and
    /// returns its ref. The highest registered seqno is the chain tip.
    pub fn add_master(&mut self, seqno: u32, shard_tips: Vec<BlockRef>) -> BlockRef {
        let master = master_ref(seqno);
        self.shards.insert(master, shard_tips);
        self.masters.insert(seqno, master);
        master
    }

    /// Registers a shard block with its parent refs and account dictionary.
    pub fn add_shard_block(
        &mut self,
        block: BlockRef,
        parents: Vec<BlockRef>,
        account_blocks: Vec<AccountBlock>,
    ) {
        self.blocks.insert(
            block,
            BlockData {
                prev: parents,
                account_blocks,
            },
        );
    }

    /// Registers an account state; `None` marks an account the chain has
    /// never seen.
    pub fn add_account(&mut self, account: Address, state: Option<AccountState>) {
        self.accounts.insert(account, state);
    }

    pub(crate) fn tip(&self) -> Option<BlockRef> {
        self.masters.values().next_back().copied()
    }

    pub(crate) fn lookup(&self, workchain: i32, shard: i64, seqno: u32) -> Option<BlockRef> {
        if workchain == MASTERCHAIN {
            return self.masters.get(&seqno).copied();
        }
        self.blocks
            .keys()
            .find(|block| {
                block.workchain() == workchain && block.shard() == shard && block.seqno() == seqno
            })
            .copied()
    }

    pub(crate) fn shard_tips(&self, master: &BlockRef) -> Option<Vec<BlockRef>> {
        self.shards.get(master).cloned()
    }

    pub(crate) fn block(&self, block: &BlockRef) -> Option<BlockData> {
        self.blocks.get(block).cloned()
    }

    pub(crate) fn account_state(&self, account: &Address) -> Option<AccountState> {
        self.accounts.get(account).copied().flatten()
    }
}
