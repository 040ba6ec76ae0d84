// Copyright (c) 2024-2026 The HLF SDK Authors

//! Typed helpers over the `qscc` query system chaincode.

use hlf_protos::common::{Block, BlockchainInfo};
use hlf_protos::peer::ProcessedTransaction;

use crate::channel::Channel;
use crate::error::Result;

const QSCC: &str = "qscc";

pub struct Qscc {
    channel: Channel,
}

impl Qscc {
    pub(crate) fn new(channel: Channel) -> Self {
        Self { channel }
    }

    /// Height and current/previous block hashes of the channel ledger.
    pub async fn chain_info(&self) -> Result<BlockchainInfo> {
        self.channel
            .chaincode(QSCC)
            .query("GetChainInfo")
            .arg_string(self.channel.name())
            .execute_proto()
            .await
    }

    pub async fn block_by_number(&self, number: u64) -> Result<Block> {
        self.channel
            .chaincode(QSCC)
            .query("GetBlockByNumber")
            .arg_string(self.channel.name())
            .arg_string(number.to_string())
            .execute_proto()
            .await
    }

    pub async fn transaction_by_id(&self, tx_id: &str) -> Result<ProcessedTransaction> {
        self.channel
            .chaincode(QSCC)
            .query("GetTransactionByID")
            .arg_string(self.channel.name())
            .arg_string(tx_id)
            .execute_proto()
            .await
    }
}
