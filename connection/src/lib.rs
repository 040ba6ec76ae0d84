// Copyright (c) 2024-2026 The HLF SDK Authors

#![deny(unsafe_code)]

//! gRPC connection support for peers and orderers.
//!
//! A [`GrpcConnection`] multiplexes RPCs over one or more endpoints with
//! round-robin selection per call, carries the TLS material each endpoint
//! was configured with, and owns the retry policy unary callers apply on
//! transport failures.

mod channel;
mod config;
mod error;
mod retry;
mod tls;

pub use crate::{
    channel::{GrpcConnection, DIAL_TIMEOUT, MAX_RECV_MSG_SIZE, MAX_SEND_MSG_SIZE},
    config::{ConnectionConfig, GrpcConfig, KeepaliveConfig, RetryConfig, TlsConfig},
    error::{Error, Result, Retryable},
    retry::RetryPolicy,
    tls::tls_cert_hash,
};
