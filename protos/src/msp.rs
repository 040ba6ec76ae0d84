// Copyright (c) 2024-2026 The HLF SDK Authors

//! Messages from `msp/identities.proto`.

/// The wire form of an identity: the MSP it belongs to plus its PEM-encoded
/// X.509 signing certificate.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SerializedIdentity {
    #[prost(string, tag = "1")]
    pub mspid: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub id_bytes: ::prost::alloc::vec::Vec<u8>,
}
