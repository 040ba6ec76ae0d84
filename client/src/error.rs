// Copyright (c) 2024-2026 The HLF SDK Authors

//! The client error taxonomy.
//!
//! Construction-time problems are `Config`-flavored and fail fast; transport
//! and routing problems are retried internally and only surface once the
//! budget is spent; endorsement problems short-circuit a submission; a
//! validation failure arrives after broadcast succeeded, with the tx id
//! still available for correlation.

use hlf_connection::Retryable;
use hlf_protos::peer::TxValidationCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // -- configuration --------------------------------------------------
    /// Pool construction was requested but no configuration was supplied.
    #[error("config was not provided")]
    EmptyConfig,

    #[error("unknown discovery type: {0} (available: local, gossip)")]
    UnknownDiscoveryType(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // -- transport ------------------------------------------------------
    #[error(transparent)]
    Connection(#[from] hlf_connection::Error),

    #[error("gRPC failure: {0}")]
    Grpc(#[from] tonic::Status),

    /// The deliver stream ended before the awaited event was seen.
    #[error("deliver stream closed")]
    StreamClosed,

    /// The deliver stream died and the reconnect budget is spent.
    #[error("deliver stream failed: {0}")]
    StreamFailed(String),

    /// The subscriber's buffer stayed full and it was detached.
    #[error("subscriber too slow, dropped from block stream")]
    SlowSubscriber,

    // -- routing --------------------------------------------------------
    #[error("no live peer for MSP {0}")]
    NoLivePeerForMsp(String),

    #[error("orderer not defined")]
    OrdererNotDefined,

    /// Submission was attempted with an empty endorsing-MSP set.
    #[error("endorsing MSPs not defined")]
    EndorserMspsNotDefined,

    // -- endorsement ----------------------------------------------------
    /// Accumulated argument-encoding failures, one line per argument.
    #[error("bad arguments:\n{0}")]
    BadArgs(String),

    /// The peer processed the proposal but refused to endorse it.
    #[error("endorsement failed on {peer}: status={status} {message}")]
    EndorsementFailed {
        peer: String,
        status: i32,
        message: String,
    },

    /// Endorsers returned diverging response payloads.
    #[error("endorsement payload mismatch across endorsers")]
    EndorsementMismatch,

    #[error("not enough endorsements: received={received}, required={required}")]
    NotEnoughEndorsements { received: usize, required: usize },

    // -- ordering -------------------------------------------------------
    #[error("orderer refused envelope: status={status} {info}")]
    OrdererRefused { status: i32, info: String },

    // -- validation -----------------------------------------------------
    /// The ledger committed the block but flagged this transaction. The tx
    /// id is carried so the caller can still correlate.
    #[error("transaction {tx_id} invalid: {}", .code.as_str_name())]
    TxInvalid {
        code: TxValidationCode,
        tx_id: String,
    },

    // -- passthrough ----------------------------------------------------
    #[error(transparent)]
    Crypto(#[from] hlf_crypto::Error),

    #[error(transparent)]
    Identity(#[from] hlf_identity::Error),

    #[error("proto decode: {0}")]
    Decode(#[from] prost::DecodeError),

    // -- cancellation ---------------------------------------------------
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    /// The validation code carried by [`Error::TxInvalid`], if any.
    pub fn validation_code(&self) -> Option<TxValidationCode> {
        match self {
            Error::TxInvalid { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl Retryable for Error {
    fn should_retry(&self) -> bool {
        match self {
            Error::Connection(e) => e.should_retry(),
            Error::Grpc(status) => status.should_retry(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_invalid_names_the_rejection() {
        let err = Error::TxInvalid {
            code: TxValidationCode::MvccReadConflict,
            tx_id: "abc123".into(),
        };
        assert_eq!(
            err.to_string(),
            "transaction abc123 invalid: MVCC_READ_CONFLICT"
        );
        assert_eq!(
            err.validation_code(),
            Some(TxValidationCode::MvccReadConflict)
        );
    }
}
