// Copyright (c) 2024-2026 The HLF SDK Authors

//! Connection-layer errors.

use displaydoc::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display)]
pub enum Error {
    /// no endpoints provided
    NoEndpoints,
    /// invalid endpoint address {0}
    InvalidAddress(String),
    /// dial failed: {0}
    DialFailed(String),
    /// TLS configuration: {0}
    Tls(String),
    /// gRPC failure: {0}
    Grpc(tonic::Status),
    /// transport failure: {0}
    Transport(tonic::transport::Error),
}

impl std::error::Error for Error {}

impl From<tonic::Status> for Error {
    fn from(src: tonic::Status) -> Self {
        Error::Grpc(src)
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(src: tonic::transport::Error) -> Self {
        Error::Transport(src)
    }
}

/// Whether an error is worth another attempt on a different (or the same)
/// backend.
pub trait Retryable {
    fn should_retry(&self) -> bool;
}

impl Retryable for tonic::Status {
    fn should_retry(&self) -> bool {
        matches!(self.code(), tonic::Code::Unavailable | tonic::Code::Aborted)
    }
}

impl Retryable for Error {
    fn should_retry(&self) -> bool {
        match self {
            Error::Grpc(status) => status.should_retry(),
            Error::Transport(_) | Error::DialFailed(_) => true,
            Error::NoEndpoints | Error::InvalidAddress(_) | Error::Tls(_) => false,
        }
    }
}
