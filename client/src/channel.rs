// Copyright (c) 2024-2026 The HLF SDK Authors

//! The per-channel facade.

use std::sync::Arc;

use hlf_identity::SigningIdentity;

use crate::chaincode::Chaincode;
use crate::deliver::{BlockSubscription, CcEventSubscription, DeliverHub, TxSubscription};
use crate::orderer::Orderer;
use crate::pool::PeerPool;
use crate::qscc::Qscc;

pub(crate) struct ChannelContext {
    pub name: String,
    pub identity: Arc<SigningIdentity>,
    pub pool: Arc<dyn PeerPool>,
    pub orderer: Option<Arc<dyn Orderer>>,
    pub hub: Arc<DeliverHub>,
    pub endorsing_msps: Vec<String>,
    pub tls_cert_hash: Option<Vec<u8>>,
}

/// One channel of the ledger: chaincode factories and block subscriptions.
#[derive(Clone)]
pub struct Channel {
    ctx: Arc<ChannelContext>,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        identity: Arc<SigningIdentity>,
        pool: Arc<dyn PeerPool>,
        orderer: Option<Arc<dyn Orderer>>,
        hub: Arc<DeliverHub>,
        endorsing_msps: Vec<String>,
    ) -> Self {
        Self {
            ctx: Arc::new(ChannelContext {
                name: name.into(),
                identity,
                pool,
                orderer,
                hub,
                endorsing_msps,
                tls_cert_hash: None,
            }),
        }
    }

    /// Binds the client TLS certificate hash into proposal headers for
    /// channel binding.
    pub fn with_tls_cert_hash(mut self, hash: Option<Vec<u8>>) -> Self {
        let ctx = Arc::get_mut(&mut self.ctx)
            .expect("with_tls_cert_hash must be called before the channel is shared");
        ctx.tls_cert_hash = hash;
        self
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn chaincode(&self, name: impl Into<String>) -> Chaincode {
        Chaincode::new(name, self.ctx.clone())
    }

    /// Typed queries against the query system chaincode.
    pub fn qscc(&self) -> Qscc {
        Qscc::new(self.clone())
    }

    pub fn subscribe_blocks(&self) -> BlockSubscription {
        self.ctx.hub.subscribe_blocks(&self.ctx.name)
    }

    pub fn subscribe_tx(&self, tx_id: impl Into<String>) -> TxSubscription {
        self.ctx.hub.subscribe_tx(&self.ctx.name, tx_id)
    }

    pub fn subscribe_cc_events(&self, chaincode: impl Into<String>) -> CcEventSubscription {
        self.ctx.hub.subscribe_cc_events(&self.ctx.name, chaincode)
    }
}
