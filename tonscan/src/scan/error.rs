//! Errors raised while interpreting fetched block data.

use crate::primitives::{Address, BlockRef};

/// A block that could not be interpreted. The shard's remaining work is
/// abandoned; scanning continues with the next shard.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// An account key in the block's dictionary was not 256 bits.
    #[error("account key in block {block} must be 32 bytes, got {len}")]
    AccountKey {
        /// Block the malformed entry belongs to.
        block: BlockRef,
        /// Length of the malformed key.
        len: usize,
    },
    /// A transaction hash was not 256 bits.
    #[error("transaction hash for account {account} must be 32 bytes, got {len}")]
    TransactionHash {
        /// Account whose transaction entry is malformed.
        account: Address,
        /// Length of the malformed hash.
        len: usize,
    },
}
