// Copyright (c) 2024-2026 The HLF SDK Authors

//! Endpoint discovery: static configuration or a remote discovery service.
//!
//! Consumers re-query on demand; providers decide their own refresh
//! cadence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use hlf_connection::TlsConfig;

use crate::config::Config;
use crate::error::Result;

/// All addresses of one organization's service, each with its own TLS
/// settings.
#[derive(Debug, Clone, Default)]
pub struct HostEndpoint {
    pub msp_id: String,
    pub host_addresses: Vec<HostAddress>,
}

#[derive(Debug, Clone, Default)]
pub struct HostAddress {
    pub address: String,
    pub tls: TlsConfig,
}

/// Chaincode-scoped discovery result.
#[derive(Debug, Clone, Default)]
pub struct ChaincodeDiscovery {
    pub chaincode: String,
    pub version: String,
    pub endorsers: Vec<HostEndpoint>,
    pub orderers: Vec<HostEndpoint>,
}

/// Channel-scoped discovery result.
#[derive(Debug, Clone, Default)]
pub struct ChannelDiscovery {
    pub orderers: Vec<HostEndpoint>,
}

/// The discovery capability set consumed by the core.
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    /// Endorsers (and orderers) able to serve `chaincode` on `channel`.
    async fn chaincode(&self, channel: &str, chaincode: &str) -> Result<ChaincodeDiscovery>;

    /// Orderers of `channel`.
    async fn channel(&self, channel: &str) -> Result<ChannelDiscovery>;

    /// Peers known locally, irrespective of channel.
    async fn local_peers(&self) -> Result<Vec<HostEndpoint>>;
}

/// Overlays locally-configured TLS settings onto endpoints by address;
/// the discovery gossip does not convey client TLS material.
#[derive(Debug, Clone, Default)]
pub struct TlsCertsMapper {
    map: HashMap<String, TlsConfig>,
}

impl TlsCertsMapper {
    pub fn new(map: HashMap<String, TlsConfig>) -> Self {
        Self { map }
    }

    /// The TLS settings for `address`; plaintext when unmapped.
    pub fn tls_for_address(&self, address: &str) -> TlsConfig {
        self.map.get(address).cloned().unwrap_or_default()
    }

    pub fn overlay(&self, endpoints: &mut [HostEndpoint]) {
        for endpoint in endpoints {
            for host in &mut endpoint.host_addresses {
                if let Some(tls) = self.map.get(&host.address) {
                    host.tls = tls.clone();
                }
            }
        }
    }
}

/// Discovery backed entirely by the loaded configuration.
pub struct LocalConfigProvider {
    endorsers: Vec<HostEndpoint>,
    orderers: Vec<HostEndpoint>,
}

impl LocalConfigProvider {
    pub fn new(config: &Config) -> Self {
        let endorsers = config
            .msp
            .iter()
            .map(|msp| HostEndpoint {
                msp_id: msp.name.clone(),
                host_addresses: msp
                    .endorsers
                    .iter()
                    .map(|e| HostAddress {
                        address: e.host.clone(),
                        tls: e.tls.clone(),
                    })
                    .collect(),
            })
            .collect();
        let orderers = vec![HostEndpoint {
            msp_id: String::new(),
            host_addresses: config
                .orderers
                .iter()
                .map(|o| HostAddress {
                    address: o.host.clone(),
                    tls: o.tls.clone(),
                })
                .collect(),
        }];
        Self {
            endorsers,
            orderers,
        }
    }
}

#[async_trait]
impl DiscoveryProvider for LocalConfigProvider {
    async fn chaincode(&self, _channel: &str, chaincode: &str) -> Result<ChaincodeDiscovery> {
        Ok(ChaincodeDiscovery {
            chaincode: chaincode.to_owned(),
            version: String::new(),
            endorsers: self.endorsers.clone(),
            orderers: self.orderers.clone(),
        })
    }

    async fn channel(&self, _channel: &str) -> Result<ChannelDiscovery> {
        Ok(ChannelDiscovery {
            orderers: self.orderers.clone(),
        })
    }

    async fn local_peers(&self) -> Result<Vec<HostEndpoint>> {
        Ok(self.endorsers.clone())
    }
}

/// The remote discovery service of a running peer, already speaking the
/// gossip wire protocol and authenticating requests with the client
/// identity. The wire protocol itself lives behind this capability set.
#[async_trait]
pub trait DiscoveryTransport: Send + Sync {
    async fn chaincode_endorsers(
        &self,
        channel: &str,
        chaincode: &str,
    ) -> Result<Vec<HostEndpoint>>;

    async fn channel_orderers(&self, channel: &str) -> Result<Vec<HostEndpoint>>;

    async fn local_peers(&self) -> Result<Vec<HostEndpoint>>;
}

/// Discovery through a peer's gossip service, with locally-configured TLS
/// settings overlaid onto every returned endpoint.
pub struct GossipProvider {
    transport: Arc<dyn DiscoveryTransport>,
    mapper: TlsCertsMapper,
}

impl GossipProvider {
    pub fn new(transport: Arc<dyn DiscoveryTransport>, mapper: TlsCertsMapper) -> Self {
        Self { transport, mapper }
    }
}

#[async_trait]
impl DiscoveryProvider for GossipProvider {
    async fn chaincode(&self, channel: &str, chaincode: &str) -> Result<ChaincodeDiscovery> {
        let mut endorsers = self.transport.chaincode_endorsers(channel, chaincode).await?;
        let mut orderers = self.transport.channel_orderers(channel).await?;
        self.mapper.overlay(&mut endorsers);
        self.mapper.overlay(&mut orderers);
        Ok(ChaincodeDiscovery {
            chaincode: chaincode.to_owned(),
            version: String::new(),
            endorsers,
            orderers,
        })
    }

    async fn channel(&self, channel: &str) -> Result<ChannelDiscovery> {
        let mut orderers = self.transport.channel_orderers(channel).await?;
        self.mapper.overlay(&mut orderers);
        Ok(ChannelDiscovery { orderers })
    }

    async fn local_peers(&self) -> Result<Vec<HostEndpoint>> {
        let mut peers = self.transport.local_peers().await?;
        self.mapper.overlay(&mut peers);
        Ok(peers)
    }
}
