// Copyright (c) 2024-2026 The HLF SDK Authors

//! Chaincode invocation: the endorsement builder and the query path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use hlf_identity::SigningIdentity;

use crate::channel::ChannelContext;
use crate::error::{Error, Result};
use crate::tx::{self, ProposalSpec};

/// A chaincode bound to one channel.
pub struct Chaincode {
    name: String,
    ctx: Arc<ChannelContext>,
}

impl Chaincode {
    pub(crate) fn new(name: impl Into<String>, ctx: Arc<ChannelContext>) -> Self {
        Self {
            name: name.into(),
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts an invocation of `function`; submission endorses, orders and
    /// awaits confirmation.
    pub fn invoke(&self, function: impl Into<String>) -> InvokeBuilder<'_> {
        InvokeBuilder {
            cc: self,
            function: function.into(),
            args: ArgList::default(),
            transient: HashMap::new(),
            identity: None,
            endorsing_msps: None,
            waiter: TxWaiter::SelfTx,
            deadline: None,
        }
    }

    /// Starts a read-only query of `function` against one live peer of the
    /// caller's own MSP; nothing is sent to the orderer.
    pub fn query(&self, function: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder {
            cc: self,
            function: function.into(),
            args: ArgList::default(),
            identity: None,
        }
    }
}

/// Which confirmation a submission waits for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TxWaiter {
    /// Await the transaction's validation flag on the channel block stream.
    #[default]
    SelfTx,
    /// Return as soon as the orderer accepts the envelope.
    None,
}

/// Outcome of a successful submission: the endorsers' response payload and
/// the definitive tx id.
#[derive(Debug, Clone)]
pub struct InvokeResult {
    pub payload: Vec<u8>,
    pub tx_id: String,
}

/// Accumulates encoded arguments; encoding failures are collected and only
/// surfaced together at submission time, since arguments may be chained in
/// any order.
#[derive(Default)]
struct ArgList {
    args: Vec<Vec<u8>>,
    errors: Vec<String>,
}

impl ArgList {
    fn push(&mut self, arg: Vec<u8>) {
        self.args.push(arg);
    }

    fn push_err(&mut self, rendered: &str, err: impl std::fmt::Display) {
        self.errors.push(format!("{}: {err}", truncate_arg(rendered)));
    }

    fn json<T: Serialize + std::fmt::Debug>(&mut self, arg: &T) {
        match serde_json::to_vec(arg) {
            Ok(bytes) => self.push(bytes),
            Err(e) => self.push_err(&format!("{arg:?}"), e),
        }
    }

    fn into_args(self) -> Result<Vec<Vec<u8>>> {
        if self.errors.is_empty() {
            Ok(self.args)
        } else {
            Err(Error::BadArgs(self.errors.join("\n")))
        }
    }
}

/// Length-capped rendering of an offending argument: the first 50 chars
/// plus a `(<dropped>)` suffix.
fn truncate_arg(rendered: &str) -> String {
    const LIMIT: usize = 50;
    if rendered.len() <= LIMIT {
        return rendered.to_owned();
    }
    let mut end = LIMIT;
    while !rendered.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...({})", &rendered[..end], rendered.len() - end)
}

pub struct InvokeBuilder<'a> {
    cc: &'a Chaincode,
    function: String,
    args: ArgList,
    transient: HashMap<String, Vec<u8>>,
    identity: Option<Arc<SigningIdentity>>,
    endorsing_msps: Option<Vec<String>>,
    waiter: TxWaiter,
    deadline: Option<Duration>,
}

impl InvokeBuilder<'_> {
    pub fn arg_bytes(mut self, arg: impl Into<Vec<u8>>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn arg_string(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().as_bytes().to_vec());
        self
    }

    pub fn arg_strings<S: AsRef<str>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        for arg in args {
            self.args.push(arg.as_ref().as_bytes().to_vec());
        }
        self
    }

    /// JSON-marshals `arg`; a marshalling failure is remembered and
    /// surfaced by `submit` as `BadArgs`.
    pub fn arg_json<T: Serialize + std::fmt::Debug>(mut self, arg: &T) -> Self {
        self.args.json(arg);
        self
    }

    /// Transient data for the endorsers; never part of the transaction.
    pub fn transient(mut self, map: HashMap<String, Vec<u8>>) -> Self {
        self.transient = map;
        self
    }

    /// Signs proposals with this identity instead of the channel's.
    pub fn with_identity(mut self, identity: Arc<SigningIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_endorsing_msps<S: Into<String>>(
        mut self,
        msps: impl IntoIterator<Item = S>,
    ) -> Self {
        self.endorsing_msps = Some(msps.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tx_waiter(mut self, waiter: TxWaiter) -> Self {
        self.waiter = waiter;
        self
    }

    /// Bounds the confirmation wait; without it the wait follows the
    /// caller's own cancellation.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Runs the submission pipeline: endorse on every requested MSP,
    /// assemble and broadcast the envelope, then await the validation
    /// outcome. Dropping the returned future cancels outstanding RPCs and
    /// detaches any subscription it installed.
    pub async fn submit(self) -> Result<InvokeResult> {
        let Self {
            cc,
            function,
            args,
            transient,
            identity,
            endorsing_msps,
            waiter,
            deadline,
        } = self;
        let ctx = cc.ctx.as_ref();

        let mut call_args = vec![function.clone().into_bytes()];
        call_args.extend(args.into_args()?);

        let orderer = ctx.orderer.clone().ok_or(Error::OrdererNotDefined)?;
        let identity = identity.unwrap_or_else(|| ctx.identity.clone());
        let msps = endorsing_msps.unwrap_or_else(|| ctx.endorsing_msps.clone());
        if msps.is_empty() {
            return Err(Error::EndorserMspsNotDefined);
        }

        let (proposal, tx_id) = ProposalSpec {
            channel: &ctx.name,
            chaincode: &cc.name,
            args: call_args,
            transient,
            signer: &identity,
            tls_cert_hash: ctx.tls_cert_hash.clone(),
        }
        .signed_proposal()?;
        debug!(channel = %ctx.name, chaincode = %cc.name, %function, %tx_id, "submitting");

        // Attach the waiter before anything leaves the client, so a block
        // committed between broadcast and subscription cannot be missed.
        let confirmation = match waiter {
            TxWaiter::SelfTx => Some(ctx.hub.subscribe_tx(&ctx.name, tx_id.clone())),
            TxWaiter::None => None,
        };

        let responses = ctx.pool.endorse_on_msps(&msps, &proposal).await?;
        if responses.len() != msps.len() {
            return Err(Error::NotEnoughEndorsements {
                received: responses.len(),
                required: msps.len(),
            });
        }

        let envelope = tx::create_envelope(&proposal, &responses, &identity)?;
        orderer.broadcast(envelope).await?;

        if let Some(sub) = confirmation {
            let wait = sub.wait();
            match deadline {
                Some(limit) => tokio::time::timeout(limit, wait)
                    .await
                    .map_err(|_| Error::DeadlineExceeded)??,
                None => wait.await?,
            };
        }

        let payload = responses
            .into_iter()
            .next()
            .and_then(|r| r.response)
            .map(|r| r.payload)
            .unwrap_or_default();
        Ok(InvokeResult { payload, tx_id })
    }
}

pub struct QueryBuilder<'a> {
    cc: &'a Chaincode,
    function: String,
    args: ArgList,
    identity: Option<Arc<SigningIdentity>>,
}

impl QueryBuilder<'_> {
    pub fn arg_bytes(mut self, arg: impl Into<Vec<u8>>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn arg_string(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().as_bytes().to_vec());
        self
    }

    pub fn arg_json<T: Serialize + std::fmt::Debug>(mut self, arg: &T) -> Self {
        self.args.json(arg);
        self
    }

    pub fn with_identity(mut self, identity: Arc<SigningIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Endorses on one live peer of the caller's MSP and returns the
    /// response payload.
    pub async fn execute(self) -> Result<Vec<u8>> {
        let Self {
            cc,
            function,
            args,
            identity,
        } = self;
        let ctx = cc.ctx.as_ref();

        let mut call_args = vec![function.into_bytes()];
        call_args.extend(args.into_args()?);

        let identity = identity.unwrap_or_else(|| ctx.identity.clone());
        let peer = ctx.pool.first_ready(identity.msp_id())?;

        let (proposal, _) = ProposalSpec {
            channel: &ctx.name,
            chaincode: &cc.name,
            args: call_args,
            transient: HashMap::new(),
            signer: &identity,
            tls_cert_hash: ctx.tls_cert_hash.clone(),
        }
        .signed_proposal()?;

        let response = peer.endorse(&proposal).await?;
        Ok(response.response.map(|r| r.payload).unwrap_or_default())
    }

    /// Runs the query and decodes the payload into a proto message.
    pub async fn execute_proto<M: prost::Message + Default>(self) -> Result<M> {
        let payload = self.execute().await?;
        Ok(M::decode(payload.as_slice())?)
    }
}
