// Copyright (c) 2024-2026 The HLF SDK Authors

//! Per-endpoint connection configuration, as it appears in the YAML config.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One dialable endpoint: `host:port` plus its TLS and gRPC tuning blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub grpc: GrpcConfig,
}

impl ConnectionConfig {
    /// Plaintext endpoint with default tuning; mostly a test convenience.
    pub fn insecure(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Skip hostname and chain verification.
    #[serde(default)]
    pub skip_verify: bool,
    /// CA bundle; when absent the system roots are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
    /// Client certificate; together with `key_path` enables mutual TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrpcConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<KeepaliveConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    #[serde(default = "default_keepalive_time")]
    pub time_secs: u64,
    #[serde(default = "default_keepalive_timeout")]
    pub timeout_secs: u64,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            time_secs: default_keepalive_time(),
            timeout_secs: default_keepalive_timeout(),
        }
    }
}

fn default_keepalive_time() -> u64 {
    60
}

fn default_keepalive_timeout() -> u64 {
    5
}

/// Unary-call retry budget: up to `max` attempts with a linear backoff of
/// `timeout_secs * attempt` between them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_max")]
    pub max: u32,
    #[serde(default = "default_retry_timeout")]
    pub timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max: default_retry_max(),
            timeout_secs: default_retry_timeout(),
        }
    }
}

fn default_retry_max() -> u32 {
    10
}

fn default_retry_timeout() -> u64 {
    10
}
