// Copyright (c) 2024-2026 The HLF SDK Authors

//! Typed helpers over the `cscc` configuration system chaincode.

use std::collections::HashMap;
use std::sync::Arc;

use prost::Message;

use hlf_identity::SigningIdentity;
use hlf_protos::common::Block;
use hlf_protos::peer::ChannelQueryResponse;

use crate::error::Result;
use crate::pool::PeerPool;
use crate::tx::ProposalSpec;

const CSCC: &str = "cscc";

/// Queries run against one live peer of the caller's MSP; cscc proposals
/// carry no channel in their header.
pub struct Cscc {
    pool: Arc<dyn PeerPool>,
    identity: Arc<SigningIdentity>,
}

impl Cscc {
    pub fn new(pool: Arc<dyn PeerPool>, identity: Arc<SigningIdentity>) -> Self {
        Self { pool, identity }
    }

    /// The channels the queried peer has joined.
    pub async fn channels(&self) -> Result<ChannelQueryResponse> {
        self.query(vec![b"GetChannels".to_vec()]).await
    }

    /// The latest config block of `channel`.
    pub async fn config_block(&self, channel: &str) -> Result<Block> {
        self.query(vec![
            b"GetConfigBlock".to_vec(),
            channel.as_bytes().to_vec(),
        ])
        .await
    }

    async fn query<M: Message + Default>(&self, args: Vec<Vec<u8>>) -> Result<M> {
        let peer = self.pool.first_ready(self.identity.msp_id())?;
        let (proposal, _) = ProposalSpec {
            channel: "",
            chaincode: CSCC,
            args,
            transient: HashMap::new(),
            signer: &self.identity,
            tls_cert_hash: None,
        }
        .signed_proposal()?;
        let response = peer.endorse(&proposal).await?;
        let payload = response.response.map(|r| r.payload).unwrap_or_default();
        Ok(M::decode(payload.as_slice())?)
    }
}
