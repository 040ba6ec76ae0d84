// Copyright (c) 2024-2026 The HLF SDK Authors

//! Shared, ordered block subscription per channel.
//!
//! The [`DeliverHub`] keeps at most one underlying deliver stream per
//! channel and demultiplexes its blocks to any number of logical
//! subscribers: tx-id waiters, chaincode-event listeners and raw-block
//! consumers. Subscribers always observe blocks in ledger order with no
//! gaps while the stream is healthy; a dead stream is reconnected from the
//! last seen block number.

use async_trait::async_trait;
use futures::stream::BoxStream;

use hlf_protos::common::Block;

use crate::error::Result;

mod hub;
mod subs;

pub use hub::{BlockSubscription, DeliverHub, HubOptions};
pub use subs::{CcEventSubscription, TxSubscription};

/// Where a deliver stream starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Oldest,
    Newest,
    Specified(u64),
}

/// An open deliver stream: blocks in ledger order until error or close.
pub type BlockStream = BoxStream<'static, Result<Block>>;

/// Anything that can open a deliver stream for a channel: an orderer
/// handle, a peer handle, or an in-memory feed in tests.
#[async_trait]
pub trait BlockSource: Send + Sync + 'static {
    async fn open(&self, channel: &str, seek: SeekFrom) -> Result<BlockStream>;
}
