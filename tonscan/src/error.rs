//! Error types shared across the scan engine.

use std::time::Duration;

use crate::primitives::BlockRef;

/// Errors surfaced by [`crate::client::NodeClient`] implementations.
///
/// All variants are considered transient unless excluded on the
/// [`crate::retry::Retrier`] wrapping the call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The call did not complete within its attempt timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// No node in the pool could serve the request.
    #[error("no node available: {0}")]
    NodeUnavailable(String),
    /// The node does not know the requested block.
    #[error("block not found: {0}")]
    BlockNotFound(BlockRef),
    /// The lite server answered with an error code.
    #[error("lite server error {code}: {message}")]
    LiteServer {
        /// Error code as reported by the node.
        code: i32,
        /// Human readable message as reported by the node.
        message: String,
    },
    /// The connection failed below the protocol layer.
    #[error("transport: {0}")]
    Transport(String),
}

/// Fatal error starting the scan engine.
///
/// Everything past startup is recovered locally: shard and account failures
/// are logged and the affected work item is dropped.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The initial masterchain info could not be obtained.
    #[error("get masterchain info: {0}")]
    MasterchainInfo(#[source] ClientError),
}
