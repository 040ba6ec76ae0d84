// Copyright (c) 2024-2026 The HLF SDK Authors

//! The orderer capability set and its gRPC implementation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use hlf_connection::{
    ConnectionConfig, GrpcConnection, MAX_RECV_MSG_SIZE, MAX_SEND_MSG_SIZE,
};
use hlf_identity::SigningIdentity;
use hlf_protos::common::{Envelope, Status};
use hlf_protos::orderer::atomic_broadcast_client::AtomicBroadcastClient;
use hlf_protos::orderer::{deliver_response, BroadcastResponse};

use crate::deliver::{BlockSource, BlockStream, SeekFrom};
use crate::error::{Error, Result};
use crate::tx;

/// Envelope submission and the channel block stream.
#[async_trait]
pub trait Orderer: Send + Sync {
    /// Submits one envelope for ordering; a non-success status surfaces as
    /// [`Error::OrdererRefused`].
    async fn broadcast(&self, envelope: Envelope) -> Result<BroadcastResponse>;

    /// Opens the ordered block stream of `channel` from `seek`.
    async fn deliver(
        &self,
        identity: &SigningIdentity,
        channel: &str,
        seek: SeekFrom,
    ) -> Result<BlockStream>;
}

/// Orderer over a (possibly multi-endpoint) gRPC connection; endpoint
/// failover rides the connection's rotation and retry policy.
pub struct GrpcOrderer {
    conn: GrpcConnection,
    identity: Option<Arc<SigningIdentity>>,
}

impl GrpcOrderer {
    pub async fn new(configs: &[ConnectionConfig]) -> Result<Self> {
        Ok(Self::from_connection(GrpcConnection::connect(configs).await?))
    }

    pub fn from_connection(conn: GrpcConnection) -> Self {
        Self {
            conn,
            identity: None,
        }
    }

    /// Identity used to sign envelopes that arrive unsigned.
    pub fn with_identity(mut self, identity: Arc<SigningIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    fn client(&self) -> AtomicBroadcastClient {
        AtomicBroadcastClient::new(self.conn.channel())
            .max_decoding_message_size(MAX_RECV_MSG_SIZE)
            .max_encoding_message_size(MAX_SEND_MSG_SIZE)
    }
}

#[async_trait]
impl Orderer for GrpcOrderer {
    async fn broadcast(&self, envelope: Envelope) -> Result<BroadcastResponse> {
        let envelope = match (&self.identity, envelope.signature.is_empty()) {
            (Some(identity), true) => Envelope {
                signature: identity.sign(&envelope.payload)?,
                payload: envelope.payload,
            },
            _ => envelope,
        };

        let response = self
            .conn
            .retry_policy()
            .run(|| {
                let mut client = self.client();
                let envelope = envelope.clone();
                async move {
                    let mut responses = client
                        .broadcast(futures::stream::iter(vec![envelope]))
                        .await?
                        .into_inner();
                    responses.message().await?.ok_or_else(|| {
                        tonic::Status::aborted("broadcast stream closed without a response")
                    })
                }
            })
            .await
            .map_err(Error::Grpc)?;

        if response.status == Status::Success as i32 {
            debug!("envelope accepted by orderer");
            Ok(response)
        } else {
            Err(Error::OrdererRefused {
                status: response.status,
                info: response.info,
            })
        }
    }

    async fn deliver(
        &self,
        identity: &SigningIdentity,
        channel: &str,
        seek: SeekFrom,
    ) -> Result<BlockStream> {
        let envelope = tx::seek_envelope(identity, channel, seek)?;
        let responses = self
            .client()
            .deliver(futures::stream::iter(vec![envelope]))
            .await?
            .into_inner();

        Ok(responses
            .map(|item| match item {
                Ok(resp) => match resp.r#type {
                    Some(deliver_response::Type::Block(block)) => Some(Ok(block)),
                    Some(deliver_response::Type::Status(code)) => {
                        if code == Status::Success as i32 {
                            None
                        } else {
                            Some(Err(Error::StreamFailed(format!("deliver status {code}"))))
                        }
                    }
                    None => None,
                },
                Err(status) => Some(Err(Error::Grpc(status))),
            })
            .take_while(|item| futures::future::ready(item.is_some()))
            .filter_map(futures::future::ready)
            .boxed())
    }
}

/// Adapts an orderer handle into the hub's block source.
pub struct OrdererBlockSource {
    orderer: Arc<dyn Orderer>,
    identity: Arc<SigningIdentity>,
}

impl OrdererBlockSource {
    pub fn new(orderer: Arc<dyn Orderer>, identity: Arc<SigningIdentity>) -> Self {
        Self { orderer, identity }
    }
}

#[async_trait]
impl BlockSource for OrdererBlockSource {
    async fn open(&self, channel: &str, seek: SeekFrom) -> Result<BlockStream> {
        self.orderer.deliver(&self.identity, channel, seek).await
    }
}
