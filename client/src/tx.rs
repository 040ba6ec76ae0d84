// Copyright (c) 2024-2026 The HLF SDK Authors

//! Proposal, envelope and seek assembly.
//!
//! The tx id is the channel-wide correlation key:
//! `lower(hex(sha256(nonce || serialized_creator)))` with a fresh 24-byte
//! nonce per proposal.

use std::collections::HashMap;
use std::time::SystemTime;

use prost::Message;
use rand::RngCore;
use sha2::{Digest, Sha256};

use hlf_identity::SigningIdentity;
use hlf_protos::common::{
    ChannelHeader, Envelope, Header, HeaderType, Payload, SignatureHeader,
};
use hlf_protos::orderer::{
    seek_position, SeekInfo, SeekNewest, SeekOldest, SeekPosition, SeekSpecified,
};
use hlf_protos::peer::{
    chaincode_spec, ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeHeaderExtension,
    ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec, ChaincodeProposalPayload,
    ChaincodeSpec, Proposal, ProposalResponse, SignedProposal, Transaction, TransactionAction,
};

use crate::deliver::SeekFrom;
use crate::error::{Error, Result};

pub const NONCE_LEN: usize = 24;

/// A fresh per-proposal nonce.
pub fn nonce() -> [u8; NONCE_LEN] {
    let mut out = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut out);
    out
}

/// Deterministic tx id over (nonce, serialized creator).
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

/// Everything needed to compose and sign one endorsement proposal.
pub(crate) struct ProposalSpec<'a> {
    pub channel: &'a str,
    pub chaincode: &'a str,
    /// Function name first, then its arguments.
    pub args: Vec<Vec<u8>>,
    pub transient: HashMap<String, Vec<u8>>,
    pub signer: &'a SigningIdentity,
    pub tls_cert_hash: Option<Vec<u8>>,
}

impl ProposalSpec<'_> {
    /// Builds the signed proposal; the returned tx id is definitive for the
    /// whole submission.
    pub fn signed_proposal(self) -> Result<(SignedProposal, String)> {
        let nonce = nonce().to_vec();
        let creator = self.signer.serialize();
        let tx_id = compute_tx_id(&nonce, &creator);

        let extension = ChaincodeHeaderExtension {
            chaincode_id: Some(chaincode_id(self.chaincode)),
        }
        .encode_to_vec();

        let channel_header = ChannelHeader {
            r#type: HeaderType::EndorserTransaction as i32,
            version: 0,
            timestamp: Some(SystemTime::now().into()),
            channel_id: self.channel.to_owned(),
            tx_id: tx_id.clone(),
            epoch: 0,
            extension,
            tls_cert_hash: self.tls_cert_hash.unwrap_or_default(),
        };
        let signature_header = SignatureHeader { creator, nonce };
        let header = Header {
            channel_header: channel_header.encode_to_vec(),
            signature_header: signature_header.encode_to_vec(),
        };

        let invocation = ChaincodeInvocationSpec {
            chaincode_spec: Some(ChaincodeSpec {
                r#type: chaincode_spec::Type::Golang as i32,
                chaincode_id: Some(chaincode_id(self.chaincode)),
                input: Some(ChaincodeInput {
                    args: self.args,
                    decorations: HashMap::new(),
                    is_init: false,
                }),
                timeout: 0,
            }),
        };
        let payload = ChaincodeProposalPayload {
            input: invocation.encode_to_vec(),
            transient_map: self.transient,
        };

        let proposal = Proposal {
            header: header.encode_to_vec(),
            payload: payload.encode_to_vec(),
            extension: Vec::new(),
        };
        let proposal_bytes = proposal.encode_to_vec();
        let signature = self.signer.sign(&proposal_bytes)?;

        Ok((
            SignedProposal {
                proposal_bytes,
                signature,
            },
            tx_id,
        ))
    }
}

/// Assembles the transaction envelope from the signed proposal and the
/// collected endorsements.
///
/// All responses must carry a byte-identical payload (which embeds the
/// proposal hash); anything else means the endorsers simulated diverging
/// results and the envelope must not be built.
pub(crate) fn create_envelope(
    signed: &SignedProposal,
    responses: &[ProposalResponse],
    signer: &SigningIdentity,
) -> Result<Envelope> {
    let first = responses.first().ok_or(Error::NotEnoughEndorsements {
        received: 0,
        required: 1,
    })?;
    if responses.iter().any(|r| r.payload != first.payload) {
        return Err(Error::EndorsementMismatch);
    }

    let proposal = Proposal::decode(signed.proposal_bytes.as_slice())?;
    let header = Header::decode(proposal.header.as_slice())?;

    // The transient map stays between client and endorsers.
    let proposal_payload = ChaincodeProposalPayload::decode(proposal.payload.as_slice())?;
    let bound_payload = ChaincodeProposalPayload {
        input: proposal_payload.input,
        transient_map: HashMap::new(),
    }
    .encode_to_vec();

    let endorsements = responses
        .iter()
        .filter_map(|r| r.endorsement.clone())
        .collect::<Vec<_>>();
    if endorsements.len() != responses.len() {
        return Err(Error::NotEnoughEndorsements {
            received: endorsements.len(),
            required: responses.len(),
        });
    }

    let action_payload = ChaincodeActionPayload {
        chaincode_proposal_payload: bound_payload,
        action: Some(ChaincodeEndorsedAction {
            proposal_response_payload: first.payload.clone(),
            endorsements,
        }),
    };
    let transaction = Transaction {
        actions: vec![TransactionAction {
            header: header.signature_header.clone(),
            payload: action_payload.encode_to_vec(),
        }],
    };

    let payload = Payload {
        header: Some(header),
        data: transaction.encode_to_vec(),
    }
    .encode_to_vec();
    let signature = signer.sign(&payload)?;

    Ok(Envelope { payload, signature })
}

/// A signed `SeekInfo` envelope opening a deliver stream on `channel`.
pub(crate) fn seek_envelope(
    identity: &SigningIdentity,
    channel: &str,
    seek: SeekFrom,
) -> Result<Envelope> {
    let start = match seek {
        SeekFrom::Oldest => seek_position::Type::Oldest(SeekOldest {}),
        SeekFrom::Newest => seek_position::Type::Newest(SeekNewest {}),
        SeekFrom::Specified(number) => seek_position::Type::Specified(SeekSpecified { number }),
    };
    let seek_info = SeekInfo {
        start: Some(SeekPosition {
            r#type: Some(start),
        }),
        stop: Some(SeekPosition {
            r#type: Some(seek_position::Type::Specified(SeekSpecified {
                number: u64::MAX,
            })),
        }),
        behavior: hlf_protos::orderer::seek_info::SeekBehavior::BlockUntilReady as i32,
        error_response: 0,
    };

    let nonce = nonce().to_vec();
    let creator = identity.serialize();
    let tx_id = compute_tx_id(&nonce, &creator);

    let channel_header = ChannelHeader {
        r#type: HeaderType::DeliverSeekInfo as i32,
        version: 0,
        timestamp: Some(SystemTime::now().into()),
        channel_id: channel.to_owned(),
        tx_id,
        epoch: 0,
        extension: Vec::new(),
        tls_cert_hash: Vec::new(),
    };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: SignatureHeader {
            creator,
            nonce,
        }
        .encode_to_vec(),
    };

    let payload = Payload {
        header: Some(header),
        data: seek_info.encode_to_vec(),
    }
    .encode_to_vec();
    let signature = identity.sign(&payload)?;

    Ok(Envelope { payload, signature })
}

fn chaincode_id(name: &str) -> ChaincodeId {
    ChaincodeId {
        path: String::new(),
        name: name.to_owned(),
        version: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlf_protos::peer::{Endorsement, Response};

    fn signer() -> SigningIdentity {
        let suite = hlf_crypto::default_suite();
        let key = suite.new_private_key().unwrap();
        SigningIdentity::new("Org1MSP", b"cert-pem".to_vec(), key, suite).unwrap()
    }

    fn response(payload: &[u8]) -> ProposalResponse {
        ProposalResponse {
            version: 0,
            timestamp: None,
            response: Some(Response {
                status: 200,
                message: String::new(),
                payload: vec![0x01],
            }),
            payload: payload.to_vec(),
            endorsement: Some(Endorsement {
                endorser: b"endorser".to_vec(),
                signature: b"sig".to_vec(),
            }),
        }
    }

    #[test]
    fn tx_id_is_deterministic_lower_hex() {
        let nonce = [7u8; NONCE_LEN];
        let creator = b"creator-identity";
        let expect = {
            let mut h = Sha256::new();
            h.update(nonce);
            h.update(creator);
            hex::encode(h.finalize())
        };
        assert_eq!(compute_tx_id(&nonce, creator), expect);
        assert_eq!(compute_tx_id(&nonce, creator), compute_tx_id(&nonce, creator));
        assert!(compute_tx_id(&nonce, creator)
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn proposal_header_carries_tx_id_and_channel() {
        let signer = signer();
        let (signed, tx_id) = ProposalSpec {
            channel: "mychannel",
            chaincode: "cc1",
            args: vec![b"set".to_vec(), b"k".to_vec(), b"v".to_vec()],
            transient: HashMap::new(),
            signer: &signer,
            tls_cert_hash: None,
        }
        .signed_proposal()
        .unwrap();

        let proposal = Proposal::decode(signed.proposal_bytes.as_slice()).unwrap();
        let header = Header::decode(proposal.header.as_slice()).unwrap();
        let channel_header = ChannelHeader::decode(header.channel_header.as_slice()).unwrap();

        assert_eq!(channel_header.r#type, HeaderType::EndorserTransaction as i32);
        assert_eq!(channel_header.channel_id, "mychannel");
        assert_eq!(channel_header.tx_id, tx_id);
        assert_eq!(channel_header.epoch, 0);

        // The signature covers the proposal bytes.
        let sig_header = SignatureHeader::decode(header.signature_header.as_slice()).unwrap();
        assert_eq!(sig_header.nonce.len(), NONCE_LEN);
        assert_eq!(tx_id, compute_tx_id(&sig_header.nonce, &sig_header.creator));
    }

    #[test]
    fn transient_map_is_stripped_from_envelope() {
        let signer = signer();
        let mut transient = HashMap::new();
        transient.insert("secret".to_owned(), b"hidden".to_vec());
        let (signed, _) = ProposalSpec {
            channel: "mychannel",
            chaincode: "cc1",
            args: vec![b"set".to_vec()],
            transient,
            signer: &signer,
            tls_cert_hash: None,
        }
        .signed_proposal()
        .unwrap();

        let envelope =
            create_envelope(&signed, &[response(b"payload"), response(b"payload")], &signer)
                .unwrap();

        let payload = Payload::decode(envelope.payload.as_slice()).unwrap();
        let transaction = Transaction::decode(payload.data.as_slice()).unwrap();
        let action = ChaincodeActionPayload::decode(
            transaction.actions[0].payload.as_slice(),
        )
        .unwrap();
        let bound =
            ChaincodeProposalPayload::decode(action.chaincode_proposal_payload.as_slice())
                .unwrap();
        assert!(bound.transient_map.is_empty());
        assert_eq!(action.action.unwrap().endorsements.len(), 2);
    }

    #[test]
    fn diverging_payloads_are_a_mismatch() {
        let signer = signer();
        let (signed, _) = ProposalSpec {
            channel: "mychannel",
            chaincode: "cc1",
            args: vec![b"set".to_vec()],
            transient: HashMap::new(),
            signer: &signer,
            tls_cert_hash: None,
        }
        .signed_proposal()
        .unwrap();

        let err = create_envelope(&signed, &[response(b"a"), response(b"b")], &signer)
            .unwrap_err();
        assert!(matches!(err, Error::EndorsementMismatch));
    }
}
