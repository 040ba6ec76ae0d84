// Copyright (c) 2024-2026 The HLF SDK Authors

//! In-memory peers, orderer and block feed for pipeline tests.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use prost::Message;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use hlf_client::{
    BlockSource, BlockStream, DeliverHub, Error, Orderer, Peer, Result, SeekFrom,
};
use hlf_identity::SigningIdentity;
use hlf_protos::common::{
    Block, BlockData, BlockHeader, BlockMetadata, BlockMetadataIndex, Envelope, Status,
};
use hlf_protos::orderer::BroadcastResponse;
use hlf_protos::peer::{
    ChaincodeAction, ChaincodeEvent, ProposalResponse, ProposalResponsePayload, Response,
    SignedProposal, TxValidationCode,
};

pub fn identity(msp_id: &str) -> Arc<SigningIdentity> {
    let suite = hlf_crypto::default_suite();
    let key = suite.new_private_key().unwrap();
    Arc::new(SigningIdentity::new(msp_id, b"test-cert-pem".to_vec(), key, suite).unwrap())
}

/// What a mock peer answers to `ProcessProposal`.
pub enum PeerScript {
    /// Endorse with the given proposal-response payload after a delay.
    Endorse {
        prp_payload: Vec<u8>,
        result_payload: Vec<u8>,
        delay: Duration,
    },
    /// Fail with a transport error after a delay.
    Unavailable { delay: Duration },
    /// Never answer; used to observe cancellation.
    Hang,
}

pub struct MockPeer {
    uri: String,
    script: PeerScript,
    pub calls: AtomicU32,
    pub cancelled: Arc<AtomicBool>,
}

impl MockPeer {
    pub fn new(uri: &str, script: PeerScript) -> Arc<Self> {
        Arc::new(Self {
            uri: uri.to_owned(),
            script,
            calls: AtomicU32::new(0),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// Raises its flag when dropped before `disarm`.
struct CancelProbe {
    armed: bool,
    flag: Arc<AtomicBool>,
}

impl CancelProbe {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelProbe {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Peer for MockPeer {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn endorse(&self, _proposal: &SignedProposal) -> Result<ProposalResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let probe = CancelProbe {
            armed: true,
            flag: self.cancelled.clone(),
        };
        let result = match &self.script {
            PeerScript::Endorse {
                prp_payload,
                result_payload,
                delay,
            } => {
                tokio::time::sleep(*delay).await;
                Ok(ProposalResponse {
                    version: 0,
                    timestamp: None,
                    response: Some(Response {
                        status: 200,
                        message: String::new(),
                        payload: result_payload.clone(),
                    }),
                    payload: prp_payload.clone(),
                    endorsement: Some(hlf_protos::peer::Endorsement {
                        endorser: self.uri.clone().into_bytes(),
                        signature: vec![0xEE],
                    }),
                })
            }
            PeerScript::Unavailable { delay } => {
                tokio::time::sleep(*delay).await;
                Err(Error::Grpc(tonic::Status::unavailable("peer down")))
            }
            PeerScript::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        };
        probe.disarm();
        result
    }

    async fn deliver(
        &self,
        _identity: &SigningIdentity,
        _channel: &str,
        _seek: SeekFrom,
    ) -> Result<BlockStream> {
        Err(Error::StreamClosed)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A proposal-response payload whose extension carries a chaincode event,
/// so committed blocks replay it to event subscribers.
pub fn prp_with_event(event: Option<ChaincodeEvent>) -> Vec<u8> {
    let action = ChaincodeAction {
        results: vec![],
        events: event.map(|e| e.encode_to_vec()).unwrap_or_default(),
        response: None,
        chaincode_id: None,
    };
    ProposalResponsePayload {
        proposal_hash: b"proposal-hash".to_vec(),
        extension: action.encode_to_vec(),
    }
    .encode_to_vec()
}

/// Orderer that "commits" every accepted envelope into the block feed with
/// a configurable validation flag.
pub struct MockOrderer {
    pub accepted: Mutex<Vec<Envelope>>,
    pub flag: TxValidationCode,
    commit: mpsc::UnboundedSender<Result<Block>>,
    next_number: AtomicU64,
}

impl MockOrderer {
    pub fn new(flag: TxValidationCode, commit: mpsc::UnboundedSender<Result<Block>>) -> Arc<Self> {
        Arc::new(Self {
            accepted: Mutex::new(Vec::new()),
            flag,
            commit,
            next_number: AtomicU64::new(1),
        })
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.lock().unwrap().len()
    }
}

#[async_trait]
impl Orderer for MockOrderer {
    async fn broadcast(&self, envelope: Envelope) -> Result<BroadcastResponse> {
        self.accepted.lock().unwrap().push(envelope.clone());
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        let _ = self.commit.send(Ok(block_with_envelopes(
            number,
            &[envelope],
            &[self.flag],
        )));
        Ok(BroadcastResponse {
            status: Status::Success as i32,
            info: String::new(),
        })
    }

    async fn deliver(
        &self,
        _identity: &SigningIdentity,
        _channel: &str,
        _seek: SeekFrom,
    ) -> Result<BlockStream> {
        Err(Error::StreamClosed)
    }
}

pub fn block_with_envelopes(
    number: u64,
    envelopes: &[Envelope],
    flags: &[TxValidationCode],
) -> Block {
    let mut metadata = vec![Vec::new(); 3];
    metadata[BlockMetadataIndex::TransactionsFilter as usize] =
        flags.iter().map(|f| *f as u8).collect();
    Block {
        header: Some(BlockHeader {
            number,
            previous_hash: vec![],
            data_hash: vec![],
        }),
        data: Some(BlockData {
            data: envelopes.iter().map(Message::encode_to_vec).collect(),
        }),
        metadata: Some(BlockMetadata { metadata }),
    }
}

/// Block source over an in-memory unbounded channel.
pub struct FeedSource {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Result<Block>>>>,
}

impl FeedSource {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedSender<Result<Block>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                rx: Mutex::new(Some(rx)),
            }),
            tx,
        )
    }
}

#[async_trait]
impl BlockSource for FeedSource {
    async fn open(&self, _channel: &str, _seek: SeekFrom) -> Result<BlockStream> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .ok_or(Error::StreamClosed)?;
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

/// Hub backed by an in-memory feed; returns the feed's sender.
pub fn feed_hub() -> (Arc<DeliverHub>, mpsc::UnboundedSender<Result<Block>>) {
    let (source, tx) = FeedSource::channel();
    (Arc::new(DeliverHub::new(source)), tx)
}
