//! Primitive structs associated with the scan engine

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use getset::CopyGetters;

/// Reference to a single block, master or shard.
///
/// Equality is structural; two refs naming the same position with the same
/// content hashes are the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BlockRef {
    workchain: i32,
    shard: i64,
    seqno: u32,
    root_hash: [u8; 32],
    file_hash: [u8; 32],
}

impl BlockRef {
    /// Creates a new BlockRef from parts
    pub fn from_parts(
        workchain: i32,
        shard: i64,
        seqno: u32,
        root_hash: [u8; 32],
        file_hash: [u8; 32],
    ) -> Self {
        Self {
            workchain,
            shard,
            seqno,
            root_hash,
            file_hash,
        }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{:016x}):{}",
            self.workchain, self.shard as u64, self.seqno
        )
    }
}

/// Raw account address: workchain plus the 256-bit account id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Address {
    workchain: i8,
    hash: [u8; 32],
}

impl Address {
    /// Creates a new Address from parts
    pub fn from_parts(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.hash))
    }
}

/// The master blocks accepted for one scan cycle, in increasing seqno order.
pub type MasterBatch = Vec<BlockRef>;

/// The shard tips associated with one master block.
pub type ShardSet = HashSet<BlockRef>;

/// A sampled transaction together with enough context to locate its block.
///
/// This is the typed payload pushed onto the output channel; downstream
/// consumers unmarshal `data` into their own transaction model.
#[derive(Debug, Clone, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct TransactionSkeleton {
    account: Address,
    hash: [u8; 32],
    logical_time: u64,
    unix_time: u32,
    master: BlockRef,
    shard: BlockRef,
    #[getset(skip)]
    data: Vec<u8>,
}

impl TransactionSkeleton {
    /// Creates a new TransactionSkeleton from parts
    pub fn from_parts(
        account: Address,
        hash: [u8; 32],
        logical_time: u64,
        unix_time: u32,
        master: BlockRef,
        shard: BlockRef,
        data: Vec<u8>,
    ) -> Self {
        Self {
            account,
            hash,
            logical_time,
            unix_time,
            master,
            shard,
            data,
        }
    }

    /// Raw transaction bytes as returned by the node.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Tagged scan result consumed by the downstream sink.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A transaction whose account passed the activity check.
    Transaction(TransactionSkeleton),
}

/// Per-cycle counters, incremented by concurrent producers and reset at the
/// start of each cycle.
#[derive(Debug, Default)]
pub struct ScanCounters {
    transactions: AtomicU64,
    shard_blocks: AtomicU64,
}

impl ScanCounters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to the number of transactions seen this cycle.
    pub fn add_transactions(&self, n: u64) {
        self.transactions.fetch_add(n, Ordering::Relaxed);
    }

    /// Adds to the number of shard blocks seen this cycle.
    pub fn add_shard_blocks(&self, n: u64) {
        self.shard_blocks.fetch_add(n, Ordering::Relaxed);
    }

    /// Transactions seen so far this cycle.
    pub fn transactions(&self) -> u64 {
        self.transactions.load(Ordering::Relaxed)
    }

    /// Shard blocks seen so far this cycle.
    pub fn shard_blocks(&self) -> u64 {
        self.shard_blocks.load(Ordering::Relaxed)
    }

    /// Zeroes both counters.
    pub fn reset(&self) {
        self.transactions.store(0, Ordering::Relaxed);
        self.shard_blocks.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of one completed cycle, handed to the lag reporter.
#[derive(Debug, Clone, Copy, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct CycleStats {
    took: Duration,
    masters: usize,
    transactions: u64,
    shard_blocks: u64,
}

impl CycleStats {
    /// Creates a new CycleStats from parts
    pub fn from_parts(took: Duration, masters: usize, transactions: u64, shard_blocks: u64) -> Self {
        Self {
            took,
            masters,
            transactions,
            shard_blocks,
        }
    }

    /// Average time spent per shard block, millisecond resolution.
    pub fn avg_block_time(&self) -> Duration {
        let rounded = Duration::from_millis((self.took.as_secs_f64() * 1000.0).round() as u64);
        if self.shard_blocks > 0 {
            rounded / self.shard_blocks as u32
        } else {
            rounded
        }
    }
}

/// Synchronization health derived from master-block lag once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// The scanner is at (or within one block of) the chain tip.
    Synced,
    /// The scanner is behind but within the out-of-sync threshold.
    CatchingUp,
    /// The scanner fell further behind than the out-of-sync threshold and
    /// has not yet caught back up to the tip.
    OutOfSync,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::CatchingUp => write!(f, "catching up"),
            SyncStatus::OutOfSync => write!(f, "out of sync"),
        }
    }
}
