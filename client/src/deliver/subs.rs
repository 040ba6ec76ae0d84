// Copyright (c) 2024-2026 The HLF SDK Authors

//! Logical subscriber kinds layered over the raw block subscription.

use std::collections::VecDeque;
use std::sync::Arc;

use prost::Message;
use tracing::debug;

use hlf_protos::common::{Block, BlockMetadataIndex, ChannelHeader, Envelope, Header, HeaderType, Payload};
use hlf_protos::peer::{
    ChaincodeAction, ChaincodeActionPayload, ChaincodeEvent, ProposalResponsePayload,
    Transaction, TxValidationCode,
};

use super::hub::BlockSubscription;
use crate::error::{Error, Result};

/// Waits until a block carrying the given tx id is delivered, then resolves
/// with that transaction's validation outcome.
pub struct TxSubscription {
    sub: BlockSubscription,
    tx_id: String,
}

impl TxSubscription {
    pub(crate) fn new(sub: BlockSubscription, tx_id: String) -> Self {
        Self { sub, tx_id }
    }

    /// Resolves with the validation code once the transaction is seen.
    /// A non-VALID flag resolves as [`Error::TxInvalid`]; the stream
    /// closing first resolves as [`Error::StreamClosed`].
    pub async fn wait(mut self) -> Result<TxValidationCode> {
        loop {
            let block = self.sub.next_block().await?;
            if let Some(code) = validation_code_for(&block, &self.tx_id) {
                debug!(tx_id = %self.tx_id, code = code.as_str_name(), "transaction committed");
                return if code == TxValidationCode::Valid {
                    Ok(code)
                } else {
                    Err(Error::TxInvalid {
                        code,
                        tx_id: self.tx_id,
                    })
                };
            }
        }
    }
}

/// Scans a block for `tx_id` and returns its flag from the
/// transactions-filter metadata.
fn validation_code_for(block: &Block, tx_id: &str) -> Option<TxValidationCode> {
    let flags = block
        .metadata
        .as_ref()
        .and_then(|m| m.metadata.get(BlockMetadataIndex::TransactionsFilter as usize))
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for (i, raw) in block.data.as_ref()?.data.iter().enumerate() {
        let Some(header) = channel_header(raw) else {
            continue;
        };
        if header.tx_id == tx_id {
            let flag = flags
                .get(i)
                .map(|b| i32::from(*b))
                .unwrap_or(TxValidationCode::NotValidated as i32);
            let code = TxValidationCode::try_from(flag)
                .unwrap_or(TxValidationCode::InvalidOtherReason);
            return Some(code);
        }
    }
    None
}

/// Yields, in block order, every event emitted by one chaincode.
pub struct CcEventSubscription {
    sub: BlockSubscription,
    chaincode: String,
    pending: VecDeque<ChaincodeEvent>,
}

impl CcEventSubscription {
    pub(crate) fn new(sub: BlockSubscription, chaincode: String) -> Self {
        Self {
            sub,
            chaincode,
            pending: VecDeque::new(),
        }
    }

    pub async fn next_event(&mut self) -> Result<ChaincodeEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }
            let block = self.sub.next_block().await?;
            self.pending.extend(events_in_block(&block, &self.chaincode));
        }
    }
}

/// Extracts the named chaincode's events from every valid-looking endorser
/// transaction in the block. Non-endorser entries (config blocks etc.) are
/// skipped.
fn events_in_block(block: &Arc<Block>, chaincode: &str) -> Vec<ChaincodeEvent> {
    let mut events = Vec::new();
    let Some(data) = block.data.as_ref() else {
        return events;
    };
    for raw in &data.data {
        let Some((header, payload)) = decode_payload(raw) else {
            continue;
        };
        if header.r#type != HeaderType::EndorserTransaction as i32 {
            continue;
        }
        let Ok(transaction) = Transaction::decode(payload.data.as_slice()) else {
            continue;
        };
        for action in &transaction.actions {
            let Some(event) = event_of_action(action.payload.as_slice()) else {
                continue;
            };
            if event.chaincode_id == chaincode {
                events.push(event);
            }
        }
    }
    events
}

fn event_of_action(action_payload: &[u8]) -> Option<ChaincodeEvent> {
    let action = ChaincodeActionPayload::decode(action_payload).ok()?;
    let endorsed = action.action?;
    let prp = ProposalResponsePayload::decode(endorsed.proposal_response_payload.as_slice()).ok()?;
    let cc_action = ChaincodeAction::decode(prp.extension.as_slice()).ok()?;
    if cc_action.events.is_empty() {
        return None;
    }
    ChaincodeEvent::decode(cc_action.events.as_slice()).ok()
}

fn decode_payload(raw: &[u8]) -> Option<(ChannelHeader, Payload)> {
    let envelope = Envelope::decode(raw).ok()?;
    let payload = Payload::decode(envelope.payload.as_slice()).ok()?;
    let header = channel_header_of(payload.header.as_ref()?)?;
    Some((header, payload))
}

fn channel_header(raw_envelope: &[u8]) -> Option<ChannelHeader> {
    decode_payload(raw_envelope).map(|(header, _)| header)
}

fn channel_header_of(header: &Header) -> Option<ChannelHeader> {
    ChannelHeader::decode(header.channel_header.as_slice()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlf_protos::common::{BlockData, BlockHeader, BlockMetadata};
    use hlf_protos::peer::{ChaincodeEndorsedAction, TransactionAction};

    fn envelope_for_tx(tx_id: &str, event: Option<ChaincodeEvent>) -> Vec<u8> {
        let channel_header = ChannelHeader {
            r#type: HeaderType::EndorserTransaction as i32,
            version: 0,
            timestamp: None,
            channel_id: "mychannel".into(),
            tx_id: tx_id.into(),
            epoch: 0,
            extension: vec![],
            tls_cert_hash: vec![],
        };
        let cc_action = ChaincodeAction {
            results: vec![],
            events: event.map(|e| e.encode_to_vec()).unwrap_or_default(),
            response: None,
            chaincode_id: None,
        };
        let prp = ProposalResponsePayload {
            proposal_hash: vec![],
            extension: cc_action.encode_to_vec(),
        };
        let action_payload = ChaincodeActionPayload {
            chaincode_proposal_payload: vec![],
            action: Some(ChaincodeEndorsedAction {
                proposal_response_payload: prp.encode_to_vec(),
                endorsements: vec![],
            }),
        };
        let transaction = Transaction {
            actions: vec![TransactionAction {
                header: vec![],
                payload: action_payload.encode_to_vec(),
            }],
        };
        let payload = Payload {
            header: Some(Header {
                channel_header: channel_header.encode_to_vec(),
                signature_header: vec![],
            }),
            data: transaction.encode_to_vec(),
        };
        Envelope {
            payload: payload.encode_to_vec(),
            signature: vec![],
        }
        .encode_to_vec()
    }

    fn block_with(txs: Vec<Vec<u8>>, flags: Vec<u8>) -> Block {
        let mut metadata = vec![Vec::new(); 3];
        metadata[BlockMetadataIndex::TransactionsFilter as usize] = flags;
        Block {
            header: Some(BlockHeader {
                number: 1,
                previous_hash: vec![],
                data_hash: vec![],
            }),
            data: Some(BlockData { data: txs }),
            metadata: Some(BlockMetadata { metadata }),
        }
    }

    #[test]
    fn finds_validation_flag_by_position() {
        let block = block_with(
            vec![envelope_for_tx("aaa", None), envelope_for_tx("bbb", None)],
            vec![
                TxValidationCode::Valid as u8,
                TxValidationCode::MvccReadConflict as u8,
            ],
        );
        assert_eq!(
            validation_code_for(&block, "aaa"),
            Some(TxValidationCode::Valid)
        );
        assert_eq!(
            validation_code_for(&block, "bbb"),
            Some(TxValidationCode::MvccReadConflict)
        );
        assert_eq!(validation_code_for(&block, "ccc"), None);
    }

    #[test]
    fn missing_flag_reads_as_not_validated() {
        let block = block_with(vec![envelope_for_tx("aaa", None)], vec![]);
        assert_eq!(
            validation_code_for(&block, "aaa"),
            Some(TxValidationCode::NotValidated)
        );
    }

    #[test]
    fn extracts_only_the_named_chaincodes_events() {
        let mine = ChaincodeEvent {
            chaincode_id: "cc1".into(),
            tx_id: "aaa".into(),
            event_name: "created".into(),
            payload: b"p1".to_vec(),
        };
        let other = ChaincodeEvent {
            chaincode_id: "cc2".into(),
            tx_id: "bbb".into(),
            event_name: "ignored".into(),
            payload: vec![],
        };
        let block = Arc::new(block_with(
            vec![
                envelope_for_tx("aaa", Some(mine.clone())),
                envelope_for_tx("bbb", Some(other)),
            ],
            vec![0, 0],
        ));
        let events = events_in_block(&block, "cc1");
        assert_eq!(events, vec![mine]);
    }
}
