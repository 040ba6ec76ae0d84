// Copyright (c) 2024-2026 The HLF SDK Authors

//! The per-MSP peer pool.
//!
//! Mutation happens under one exclusive lock; selection works on a cloned
//! snapshot so no network call ever holds the lock. A handle marked dead is
//! skipped by selection but stays installed, and its probe keeps running so
//! a recovered peer rejoins the rotation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use hlf_connection::Retryable;
use hlf_protos::peer::{ProposalResponse, SignedProposal};

use crate::error::{Error, Result};
use crate::peer::Peer;

/// How a pooled handle is monitored.
#[derive(Debug, Clone, Copy)]
pub enum LivenessCheck {
    /// Probe the peer over its transport at this interval.
    Grpc { interval: Duration },
    /// Fixed verdict; deterministic strategy for tests.
    Static(bool),
}

impl LivenessCheck {
    /// The conventional strategy: gRPC probe every 5 seconds.
    pub fn grpc_default() -> Self {
        Self::Grpc {
            interval: Duration::from_secs(5),
        }
    }
}

/// The pool capability set consumed by the endorsement builder.
#[async_trait]
pub trait PeerPool: Send + Sync {
    /// Installs a peer under its MSP. Idempotent on `(msp_id, uri)`: a
    /// second add keeps the existing handle and its probe.
    fn add(&self, msp_id: &str, peer: Arc<dyn Peer>, liveness: LivenessCheck) -> Result<()>;

    /// Snapshot of the live handles per MSP.
    fn peers(&self) -> HashMap<String, Vec<Arc<dyn Peer>>>;

    /// One live peer of the MSP.
    fn first_ready(&self, msp_id: &str) -> Result<Arc<dyn Peer>>;

    /// One endorsement from the MSP, rotating across its live peers on
    /// transport errors until one answers or all are exhausted.
    async fn endorse_on_msp(
        &self,
        msp_id: &str,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse>;

    /// Concurrent fan-out: one endorsement per requested MSP, returned in
    /// the order of `msp_ids` regardless of arrival order. The first
    /// failure cancels the in-flight siblings.
    async fn endorse_on_msps(
        &self,
        msp_ids: &[String],
        proposal: &SignedProposal,
    ) -> Result<Vec<ProposalResponse>>;

    /// Stops every liveness probe. Handles stay usable for in-flight calls.
    fn close(&self);
}

struct Member {
    peer: Arc<dyn Peer>,
    state: Arc<MemberState>,
    probe: Option<JoinHandle<()>>,
}

/// Shared between the pool, its probes and in-flight selections.
struct MemberState {
    alive: AtomicBool,
    last_error: std::sync::Mutex<Option<String>>,
}

impl MemberState {
    fn new(alive: bool) -> Arc<Self> {
        Arc::new(Self {
            alive: AtomicBool::new(alive),
            last_error: std::sync::Mutex::new(None),
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Marks the handle dead, keeping the error that killed it.
    fn mark_dead(&self, error: impl ToString) -> bool {
        *self.last_error.lock().expect("member state poisoned") = Some(error.to_string());
        self.alive.swap(false, Ordering::AcqRel)
    }

    fn mark_alive(&self) -> bool {
        self.alive.swap(true, Ordering::AcqRel)
    }
}

/// The standard pool implementation.
#[derive(Default)]
pub struct MspPeerPool {
    members: RwLock<HashMap<String, Vec<Member>>>,
}

impl MspPeerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live members of one MSP, in installation order.
    fn live_members(&self, msp_id: &str) -> Vec<(Arc<dyn Peer>, Arc<MemberState>)> {
        let members = self.members.read().expect("pool lock poisoned");
        members
            .get(msp_id)
            .map(|list| {
                list.iter()
                    .filter(|m| m.state.is_alive())
                    .map(|m| (m.peer.clone(), m.state.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl PeerPool for MspPeerPool {
    fn add(&self, msp_id: &str, peer: Arc<dyn Peer>, liveness: LivenessCheck) -> Result<()> {
        let mut members = self.members.write().expect("pool lock poisoned");
        let list = members.entry(msp_id.to_owned()).or_default();
        if list.iter().any(|m| m.peer.uri() == peer.uri()) {
            debug!(msp_id, uri = peer.uri(), "peer already pooled");
            return Ok(());
        }

        let (state, probe) = match liveness {
            LivenessCheck::Grpc { interval } => {
                let state = MemberState::new(true);
                let probe =
                    spawn_probe(msp_id.to_owned(), peer.clone(), state.clone(), interval);
                (state, Some(probe))
            }
            LivenessCheck::Static(verdict) => (MemberState::new(verdict), None),
        };
        debug!(msp_id, uri = peer.uri(), "peer added to pool");
        list.push(Member { peer, state, probe });
        Ok(())
    }

    fn peers(&self) -> HashMap<String, Vec<Arc<dyn Peer>>> {
        let members = self.members.read().expect("pool lock poisoned");
        members
            .iter()
            .map(|(msp, list)| {
                let live = list
                    .iter()
                    .filter(|m| m.state.is_alive())
                    .map(|m| m.peer.clone())
                    .collect();
                (msp.clone(), live)
            })
            .collect()
    }

    fn first_ready(&self, msp_id: &str) -> Result<Arc<dyn Peer>> {
        self.live_members(msp_id)
            .into_iter()
            .map(|(peer, _)| peer)
            .next()
            .ok_or_else(|| Error::NoLivePeerForMsp(msp_id.to_owned()))
    }

    async fn endorse_on_msp(
        &self,
        msp_id: &str,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse> {
        let members = self.live_members(msp_id);
        if members.is_empty() {
            return Err(Error::NoLivePeerForMsp(msp_id.to_owned()));
        }

        let mut last_err = None;
        for (peer, state) in members {
            match peer.endorse(proposal).await {
                Ok(response) => return Ok(response),
                Err(e) if e.should_retry() => {
                    warn!(msp_id, peer = peer.uri(), error = %e, "peer failed, trying next");
                    state.mark_dead(&e);
                    last_err = Some(e);
                }
                // A chaincode-level refusal short-circuits; other peers of
                // the same MSP would simulate the same result.
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::NoLivePeerForMsp(msp_id.to_owned())))
    }

    async fn endorse_on_msps(
        &self,
        msp_ids: &[String],
        proposal: &SignedProposal,
    ) -> Result<Vec<ProposalResponse>> {
        if msp_ids.is_empty() {
            return Err(Error::EndorserMspsNotDefined);
        }

        let required = msp_ids.len();
        let mut in_flight = msp_ids
            .iter()
            .enumerate()
            .map(|(index, msp_id)| async move {
                (index, self.endorse_on_msp(msp_id, proposal).await)
            })
            .collect::<FuturesUnordered<_>>();

        let mut slots: Vec<Option<ProposalResponse>> = (0..required).map(|_| None).collect();
        let mut received = 0usize;
        while let Some((index, result)) = in_flight.next().await {
            match result {
                Ok(response) => {
                    slots[index] = Some(response);
                    received += 1;
                }
                Err(e) => {
                    warn!(msp_id = %msp_ids[index], error = %e, "endorsement fan-out failed");
                    // Dropping the set cancels the in-flight siblings.
                    drop(in_flight);
                    return Err(Error::NotEnoughEndorsements { received, required });
                }
            }
        }

        Ok(slots
            .into_iter()
            .map(|slot| slot.expect("every fan-out slot resolved"))
            .collect())
    }

    fn close(&self) {
        let mut members = self.members.write().expect("pool lock poisoned");
        for list in members.values_mut() {
            for member in list.iter_mut() {
                if let Some(probe) = member.probe.take() {
                    probe.abort();
                }
            }
        }
    }
}

impl Drop for MspPeerPool {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_probe(
    msp_id: String,
    peer: Arc<dyn Peer>,
    state: Arc<MemberState>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The handle starts out alive; the first tick fires immediately and
        // only confirms or revokes that.
        loop {
            ticker.tick().await;
            match peer.ping().await {
                Ok(()) => {
                    if !state.mark_alive() {
                        debug!(msp_id, peer = peer.uri(), "peer recovered");
                    }
                }
                Err(e) => {
                    if state.mark_dead(&e) {
                        warn!(msp_id, peer = peer.uri(), error = %e, "peer marked dead");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    use hlf_identity::SigningIdentity;
    use hlf_protos::peer::Response;

    use crate::deliver::{BlockStream, SeekFrom};

    enum Behavior {
        Endorse { marker: u8, delay: Duration },
        Transport { delay: Duration },
        Refuse,
    }

    struct TestPeer {
        uri: String,
        behavior: Behavior,
        calls: AtomicU32,
    }

    impl TestPeer {
        fn new(uri: &str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                uri: uri.to_owned(),
                behavior,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Peer for TestPeer {
        fn uri(&self) -> &str {
            &self.uri
        }

        async fn endorse(&self, _proposal: &SignedProposal) -> Result<ProposalResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Endorse { marker, delay } => {
                    tokio::time::sleep(*delay).await;
                    Ok(ProposalResponse {
                        version: 0,
                        timestamp: None,
                        response: Some(Response {
                            status: 200,
                            message: String::new(),
                            payload: vec![*marker],
                        }),
                        payload: vec![*marker],
                        endorsement: None,
                    })
                }
                Behavior::Transport { delay } => {
                    tokio::time::sleep(*delay).await;
                    Err(Error::Grpc(tonic::Status::unavailable("connection refused")))
                }
                Behavior::Refuse => Err(Error::EndorsementFailed {
                    peer: self.uri.clone(),
                    status: 500,
                    message: "chaincode says no".to_owned(),
                }),
            }
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

    fn proposal() -> SignedProposal {
        SignedProposal {
            proposal_bytes: vec![1, 2, 3],
            signature: vec![4, 5, 6],
        }
    }

    fn ok_peer(uri: &str, marker: u8, delay_ms: u64) -> Arc<TestPeer> {
        TestPeer::new(
            uri,
            Behavior::Endorse {
                marker,
                delay: Duration::from_millis(delay_ms),
            },
        )
    }

    #[tokio::test]
    async fn add_is_idempotent_per_msp_and_address() {
        let pool = MspPeerPool::new();
        let peer = ok_peer("peer0:7051", 1, 0);
        pool.add("Org1MSP", peer.clone(), LivenessCheck::Static(true))
            .unwrap();
        pool.add("Org1MSP", peer, LivenessCheck::Static(true)).unwrap();
        assert_eq!(pool.peers()["Org1MSP"].len(), 1);
    }

    #[tokio::test]
    async fn first_ready_skips_dead_handles() {
        let pool = MspPeerPool::new();
        pool.add("Org1MSP", ok_peer("dead:7051", 1, 0), LivenessCheck::Static(false))
            .unwrap();
        pool.add("Org1MSP", ok_peer("live:7051", 2, 0), LivenessCheck::Static(true))
            .unwrap();

        assert_eq!(pool.first_ready("Org1MSP").unwrap().uri(), "live:7051");

        let err = pool.first_ready("Org2MSP").unwrap_err();
        assert!(matches!(err, Error::NoLivePeerForMsp(msp) if msp == "Org2MSP"));
    }

    #[tokio::test]
    async fn endorse_rotates_to_next_peer_on_transport_error() {
        let pool = MspPeerPool::new();
        let flaky = TestPeer::new(
            "flaky:7051",
            Behavior::Transport {
                delay: Duration::ZERO,
            },
        );
        let solid = ok_peer("solid:7051", 9, 0);
        pool.add("Org1MSP", flaky.clone(), LivenessCheck::Static(true))
            .unwrap();
        pool.add("Org1MSP", solid, LivenessCheck::Static(true)).unwrap();

        let response = pool.endorse_on_msp("Org1MSP", &proposal()).await.unwrap();
        assert_eq!(response.payload, vec![9]);
        assert_eq!(flaky.calls(), 1);
        // The failed handle is out of the live set but still installed.
        assert_eq!(pool.peers()["Org1MSP"].len(), 1);
    }

    #[tokio::test]
    async fn chaincode_refusal_short_circuits_the_rotation() {
        let pool = MspPeerPool::new();
        let refusing = TestPeer::new("refusing:7051", Behavior::Refuse);
        let never = ok_peer("never:7051", 3, 0);
        pool.add("Org1MSP", refusing, LivenessCheck::Static(true))
            .unwrap();
        pool.add("Org1MSP", never.clone(), LivenessCheck::Static(true))
            .unwrap();

        let err = pool.endorse_on_msp("Org1MSP", &proposal()).await.unwrap_err();
        assert!(matches!(err, Error::EndorsementFailed { .. }));
        assert_eq!(never.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fan_out_results_follow_request_order_not_arrival_order() {
        let pool = MspPeerPool::new();
        // Arrival order is C, B, A; the result must still be A, B, C.
        pool.add("A", ok_peer("a:7051", 1, 30), LivenessCheck::Static(true))
            .unwrap();
        pool.add("B", ok_peer("b:7051", 2, 20), LivenessCheck::Static(true))
            .unwrap();
        pool.add("C", ok_peer("c:7051", 3, 10), LivenessCheck::Static(true))
            .unwrap();

        let msps: Vec<String> = ["A", "B", "C"].map(str::to_owned).into();
        let responses = pool.endorse_on_msps(&msps, &proposal()).await.unwrap();
        let markers: Vec<u8> = responses.iter().map(|r| r.payload[0]).collect();
        assert_eq!(markers, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn fan_out_failure_reports_received_and_cancels_siblings() {
        let pool = MspPeerPool::new();
        pool.add("A", ok_peer("a:7051", 1, 0), LivenessCheck::Static(true))
            .unwrap();
        pool.add(
            "B",
            TestPeer::new(
                "b:7051",
                Behavior::Transport {
                    delay: Duration::from_millis(5),
                },
            ),
            LivenessCheck::Static(true),
        )
        .unwrap();
        // Would take 10 s if not cancelled; paused time would expose a hang.
        pool.add("C", ok_peer("c:7051", 3, 10_000), LivenessCheck::Static(true))
            .unwrap();

        let msps: Vec<String> = ["A", "B", "C"].map(str::to_owned).into();
        let err = pool.endorse_on_msps(&msps, &proposal()).await.unwrap_err();
        assert!(
            matches!(err, Error::NotEnoughEndorsements { received: 1, required: 3 }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn empty_msp_set_is_an_explicit_error() {
        let pool = MspPeerPool::new();
        let err = pool.endorse_on_msps(&[], &proposal()).await.unwrap_err();
        assert!(matches!(err, Error::EndorserMspsNotDefined));
    }
}
