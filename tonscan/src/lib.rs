#![warn(missing_docs)]
//! TON chain scan engine
//!
//! Walks the masterchain block sequence, discovers every shard block produced
//! between consecutive master blocks (including ones a naive tip comparison
//! would skip), samples one transaction per touched account from each shard
//! block, verifies the account is still active on-chain and streams the
//! surviving transactions to the output channel.
//!
//! Entrypoint: [`crate::sync::run`]

pub mod client;
pub mod config;
pub mod error;
#[allow(missing_docs)]
pub mod primitives;
pub mod retry;
pub mod scan;
pub mod sync;
pub(crate) mod utils;
