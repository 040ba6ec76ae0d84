// Copyright (c) 2024-2026 The HLF SDK Authors

//! The peer capability set and its gRPC implementation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::trace;

use hlf_connection::{
    ConnectionConfig, GrpcConnection, MAX_RECV_MSG_SIZE, MAX_SEND_MSG_SIZE,
};
use hlf_identity::SigningIdentity;
use hlf_protos::common::Status;
use hlf_protos::peer::deliver_client::DeliverClient;
use hlf_protos::peer::endorser_client::EndorserClient;
use hlf_protos::peer::{deliver_response, ProposalResponse, SignedProposal};

use crate::deliver::{BlockStream, SeekFrom};
use crate::error::{Error, Result};
use crate::tx;

/// One endorsing peer: proposal processing, block subscription and a cheap
/// liveness probe.
#[async_trait]
pub trait Peer: Send + Sync {
    /// `host:port` the handle talks to.
    fn uri(&self) -> &str;

    /// SHA-256 of the client TLS certificate used toward this peer, if
    /// mutual TLS is configured.
    fn tls_cert_hash(&self) -> Option<Vec<u8>> {
        None
    }

    async fn endorse(&self, proposal: &SignedProposal) -> Result<ProposalResponse>;

    async fn deliver(
        &self,
        identity: &SigningIdentity,
        channel: &str,
        seek: SeekFrom,
    ) -> Result<BlockStream>;

    /// Reachability check used by the pool's liveness strategy.
    async fn ping(&self) -> Result<()>;
}

impl std::fmt::Debug for dyn Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer").field("uri", &self.uri()).finish()
    }
}

pub struct GrpcPeer {
    conn: GrpcConnection,
    uri: String,
}

impl GrpcPeer {
    pub async fn new(config: &ConnectionConfig) -> Result<Self> {
        let conn = GrpcConnection::connect_one(config).await?;
        Ok(Self {
            uri: config.host.clone(),
            conn,
        })
    }

    pub fn from_connection(uri: impl Into<String>, conn: GrpcConnection) -> Self {
        Self {
            uri: uri.into(),
            conn,
        }
    }

    fn endorser(&self) -> EndorserClient {
        EndorserClient::new(self.conn.channel())
            .max_decoding_message_size(MAX_RECV_MSG_SIZE)
            .max_encoding_message_size(MAX_SEND_MSG_SIZE)
    }

    fn deliver_client(&self) -> DeliverClient {
        DeliverClient::new(self.conn.channel())
            .max_decoding_message_size(MAX_RECV_MSG_SIZE)
            .max_encoding_message_size(MAX_SEND_MSG_SIZE)
    }
}

#[async_trait]
impl Peer for GrpcPeer {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn tls_cert_hash(&self) -> Option<Vec<u8>> {
        self.conn.tls_cert_hash().map(<[u8]>::to_vec)
    }

    async fn endorse(&self, proposal: &SignedProposal) -> Result<ProposalResponse> {
        trace!(peer = %self.uri, "process proposal");
        let response = self
            .conn
            .retry_policy()
            .run(|| {
                let mut client = self.endorser();
                let proposal = proposal.clone();
                async move { client.process_proposal(proposal).await }
            })
            .await
            .map_err(Error::Grpc)?
            .into_inner();

        match &response.response {
            Some(r) if r.status == 200 => Ok(response),
            Some(r) => Err(Error::EndorsementFailed {
                peer: self.uri.clone(),
                status: r.status,
                message: r.message.clone(),
            }),
            None => Err(Error::EndorsementFailed {
                peer: self.uri.clone(),
                status: 0,
                message: "empty proposal response".to_owned(),
            }),
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
            .deliver_client()
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

    async fn ping(&self) -> Result<()> {
        Ok(self.conn.probe().await?)
    }
}

impl std::fmt::Debug for GrpcPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcPeer").field("uri", &self.uri).finish()
    }
}
