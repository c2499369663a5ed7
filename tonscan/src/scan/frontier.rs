//! Resolution of the shard blocks not yet processed between two master
//! blocks.
//!
//! Shard tips referenced by consecutive master blocks can skip seqnos when
//! shards split or merge; walking parent links from each tip recovers the
//! holes a naive tip-to-tip comparison would miss.

use std::collections::HashSet;

use crate::client::NodeClient;
use crate::error::ClientError;
use crate::primitives::{BlockRef, ShardSet};

enum Frame {
    Enter(BlockRef),
    Exit(BlockRef),
}

/// Returns the shard blocks reachable from `tips` that are not members of
/// `prev_shards`, parents ordered before children.
///
/// The walk is an explicit depth-first traversal with a visited set keyed by
/// structural equality, so deep or wide shard graphs cannot grow the call
/// stack and a merge with multiple parents visits every parent path once.
/// Only `tracked_workchain` shards are followed. Parent links strictly
/// decrease seqno and bottom out in `prev_shards`, so the walk terminates on
/// any finite graph.
pub async fn not_seen_shards<C>(
    client: &C,
    tips: &[BlockRef],
    prev_shards: &ShardSet,
    tracked_workchain: i32,
) -> Result<Vec<BlockRef>, ClientError>
where
    C: NodeClient + ?Sized,
{
    let mut collected = Vec::new();
    let mut visited: HashSet<BlockRef> = HashSet::new();
    let mut stack: Vec<Frame> = Vec::new();

    for tip in tips {
        stack.push(Frame::Enter(*tip));

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(block) => {
                    if block.workchain() != tracked_workchain {
                        continue;
                    }
                    if prev_shards.contains(&block) {
                        continue;
                    }
                    if !visited.insert(block) {
                        continue;
                    }

                    let data = client.block_data(&block).await?;

                    // Parents are pushed in reverse so they pop, and hence
                    // emit, in header order before the block itself.
                    stack.push(Frame::Exit(block));
                    for parent in data.prev.iter().rev() {
                        stack.push(Frame::Enter(*parent));
                    }
                }
                Frame::Exit(block) => collected.push(block),
            }
        }
    }

    Ok(collected)
}
