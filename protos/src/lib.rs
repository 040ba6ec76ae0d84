// Copyright (c) 2024-2026 The HLF SDK Authors

//! Hand-maintained mirror of the Hyperledger Fabric protobuf messages this
//! SDK speaks on the wire, plus tonic clients for the three gRPC services
//! consumed by the client core (Endorser, Deliver, AtomicBroadcast).
//!
//! The structs follow the prost code-generation conventions so they stay
//! byte-compatible with fabric-protos; only the subset the SDK actually
//! sends or decodes is mirrored here.

pub mod common;
pub mod msp;
pub mod orderer;
pub mod peer;

pub use prost::Message;
