// Copyright (c) 2024-2026 The HLF SDK Authors

#![deny(unsafe_code)]

//! Client core for Fabric-family permissioned ledgers.
//!
//! The pipeline: an invocation is signed into a proposal, fanned out to a
//! policy-defined set of endorsing MSPs through the peer pool, the
//! collected endorsements are assembled into an envelope, broadcast to the
//! orderer, and the transaction's validation outcome is awaited on the
//! channel's shared block stream.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hlf_client::{Config, Core};
//! use hlf_identity::Msp;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let suite = hlf_crypto::default_suite();
//! let identity = Arc::new(Msp::from_path("Org1MSP", "/etc/hlf/msp", suite)?.into_signer());
//!
//! let core = Core::builder(identity)
//!     .with_config(Config::from_yaml_file("config.yaml")?)
//!     .build()
//!     .await?;
//!
//! let channel = core.channel("mychannel").await;
//! let result = channel
//!     .chaincode("cc1")
//!     .invoke("set")
//!     .arg_string("k")
//!     .arg_string("v")
//!     .submit()
//!     .await?;
//! println!("committed tx {}", result.tx_id);
//! # Ok(())
//! # }
//! ```

pub mod chaincode;
pub mod channel;
pub mod config;
pub mod core;
pub mod cscc;
pub mod deliver;
pub mod discovery;
pub mod error;
pub mod orderer;
pub mod peer;
pub mod pool;
pub mod qscc;
pub mod tx;

pub use crate::{
    chaincode::{Chaincode, InvokeBuilder, InvokeResult, QueryBuilder, TxWaiter},
    channel::Channel,
    config::{Config, CryptoConfig, DiscoveryConfig, MspConfig},
    core::{Core, CoreBuilder},
    cscc::Cscc,
    deliver::{
        BlockSource, BlockStream, BlockSubscription, CcEventSubscription, DeliverHub,
        HubOptions, SeekFrom, TxSubscription,
    },
    discovery::{
        ChaincodeDiscovery, ChannelDiscovery, DiscoveryProvider, DiscoveryTransport,
        GossipProvider, HostAddress, HostEndpoint, LocalConfigProvider, TlsCertsMapper,
    },
    error::{Error, Result},
    orderer::{GrpcOrderer, Orderer, OrdererBlockSource},
    peer::{GrpcPeer, Peer},
    pool::{LivenessCheck, MspPeerPool, PeerPool},
    qscc::Qscc,
    tx::{compute_tx_id, nonce, NONCE_LEN},
};
