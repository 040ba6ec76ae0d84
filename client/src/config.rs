// Copyright (c) 2024-2026 The HLF SDK Authors

//! The loaded YAML configuration model.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hlf_connection::{ConnectionConfig, TlsConfig};

use crate::error::{Error, Result};

pub const LOCAL_DISCOVERY_TYPE: &str = "local";
pub const GOSSIP_DISCOVERY_TYPE: &str = "gossip";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Member organizations and their endorsing peers.
    #[serde(default)]
    pub msp: Vec<MspConfig>,

    /// Default orderer endpoint set.
    #[serde(default)]
    pub orderers: Vec<ConnectionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto: Option<CryptoConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryConfig>,

    /// TLS settings keyed by `host:port`, overlaid onto discovered
    /// endpoints (gossip does not convey client TLS material).
    #[serde(default)]
    pub tls_certs_map: HashMap<String, TlsConfig>,

    /// MSPs asked for endorsement when an invocation names none.
    #[serde(default)]
    pub endorsing_msps: Vec<String>,
}

impl Config {
    pub fn from_yaml(bytes: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(bytes).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::InvalidConfig(format!("read {}: {e}", path.display())))?;
        Self::from_yaml(&bytes)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MspConfig {
    pub name: String,
    #[serde(default)]
    pub endorsers: Vec<ConnectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    pub r#type: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// `local` or `gossip`.
    pub r#type: String,

    /// Adapter-specific options, passed through opaque.
    #[serde(default)]
    pub options: serde_yaml::Value,

    /// The peer whose discovery service the gossip adapter queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
msp:
  - name: Org1MSP
    endorsers:
      - host: peer0.org1.example.com:7051
        tls:
          enabled: true
          ca_cert_path: /etc/hlf/tlsca.org1.pem
  - name: Org2MSP
    endorsers:
      - host: peer0.org2.example.com:9051
orderers:
  - host: orderer0.example.com:7050
    grpc:
      keepalive:
        time_secs: 30
        timeout_secs: 5
      retry:
        max: 4
        timeout_secs: 1
discovery:
  type: local
tls_certs_map:
  "peer1.org1.example.com:8051":
    enabled: true
    ca_cert_path: /etc/hlf/tlsca.org1.pem
endorsing_msps: [Org1MSP, Org2MSP]
"#;

    #[test]
    fn parses_the_documented_shape() {
        let config = Config::from_yaml(SAMPLE.as_bytes()).unwrap();
        assert_eq!(config.msp.len(), 2);
        assert_eq!(config.msp[0].name, "Org1MSP");
        assert!(config.msp[0].endorsers[0].tls.enabled);
        assert_eq!(config.orderers.len(), 1);
        let retry = config.orderers[0].grpc.retry.unwrap();
        assert_eq!(retry.max, 4);
        assert_eq!(
            config.discovery.as_ref().unwrap().r#type,
            LOCAL_DISCOVERY_TYPE
        );
        assert!(config
            .tls_certs_map
            .contains_key("peer1.org1.example.com:8051"));
        assert_eq!(config.endorsing_msps, vec!["Org1MSP", "Org2MSP"]);
    }

    #[test]
    fn bad_yaml_is_invalid_config() {
        let err = Config::from_yaml(b"msp: {not: [a, list").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
