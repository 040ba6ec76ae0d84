// Copyright (c) 2024-2026 The HLF SDK Authors

//! The facade composing identity, pool, orderer, discovery and channels.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use hlf_connection::ConnectionConfig;
use hlf_crypto::CryptoSuite;
use hlf_identity::SigningIdentity;

use crate::channel::Channel;
use crate::config::{Config, CryptoConfig, DiscoveryConfig, GOSSIP_DISCOVERY_TYPE, LOCAL_DISCOVERY_TYPE};
use crate::deliver::{BlockSource, BlockStream, DeliverHub, SeekFrom};
use crate::discovery::{
    DiscoveryProvider, DiscoveryTransport, GossipProvider, HostEndpoint, LocalConfigProvider,
    TlsCertsMapper,
};
use crate::error::{Error, Result};
use crate::orderer::{GrpcOrderer, Orderer, OrdererBlockSource};
use crate::peer::{GrpcPeer, Peer};
use crate::pool::{LivenessCheck, MspPeerPool, PeerPool};

/// The client core. Cheap to share behind an [`Arc`]; channels are cached
/// per name.
pub struct Core {
    identity: Arc<SigningIdentity>,
    suite: Arc<dyn CryptoSuite>,
    pool: Arc<dyn PeerPool>,
    orderer: Option<Arc<dyn Orderer>>,
    discovery: Option<Arc<dyn DiscoveryProvider>>,
    endorsing_msps: Vec<String>,
    channels: Mutex<HashMap<String, Channel>>,
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core").finish_non_exhaustive()
    }
}

impl Core {
    pub fn builder(identity: Arc<SigningIdentity>) -> CoreBuilder {
        CoreBuilder {
            identity,
            config: None,
            config_path: None,
            crypto: None,
            suite: None,
            pool: None,
            orderer: None,
            discovery: None,
            discovery_transport: None,
            extra_peers: Vec::new(),
            endorsing_msps: None,
        }
    }

    pub fn identity(&self) -> &Arc<SigningIdentity> {
        &self.identity
    }

    pub fn crypto_suite(&self) -> &Arc<dyn CryptoSuite> {
        &self.suite
    }

    pub fn pool(&self) -> &Arc<dyn PeerPool> {
        &self.pool
    }

    pub fn discovery(&self) -> Option<&Arc<dyn DiscoveryProvider>> {
        self.discovery.as_ref()
    }

    /// Typed queries against the configuration system chaincode.
    pub fn cscc(&self) -> crate::cscc::Cscc {
        crate::cscc::Cscc::new(self.pool.clone(), self.identity.clone())
    }

    /// Live peers of the client's own MSP.
    pub fn current_msp_peers(&self) -> Vec<Arc<dyn Peer>> {
        self.pool
            .peers()
            .remove(self.identity.msp_id())
            .unwrap_or_default()
    }

    /// The channel facade, cached per name. Channel discovery is consulted
    /// for channel-specific orderers; on failure the default orderer is
    /// used.
    pub async fn channel(&self, name: &str) -> Channel {
        let mut channels = self.channels.lock().await;
        if let Some(channel) = channels.get(name) {
            return channel.clone();
        }
        debug!(channel = name, "channel instance does not exist, initiating new");

        let orderer = self.channel_orderer(name).await;
        let source: Arc<dyn BlockSource> = match &orderer {
            Some(orderer) => Arc::new(OrdererBlockSource::new(
                orderer.clone(),
                self.identity.clone(),
            )),
            None => Arc::new(NoBlockSource),
        };
        let channel = Channel::new(
            name,
            self.identity.clone(),
            self.pool.clone(),
            orderer,
            Arc::new(DeliverHub::new(source)),
            self.endorsing_msps.clone(),
        )
        .with_tls_cert_hash(self.pool_tls_cert_hash());

        channels.insert(name.to_owned(), channel.clone());
        channel
    }

    async fn channel_orderer(&self, name: &str) -> Option<Arc<dyn Orderer>> {
        let Some(discovery) = self.discovery.as_ref() else {
            return self.orderer.clone();
        };
        match discovery.channel(name).await {
            Ok(discovered) if !discovered.orderers.is_empty() => {
                let configs = connection_configs(&discovered.orderers);
                match GrpcOrderer::new(&configs).await {
                    Ok(orderer) => {
                        Some(Arc::new(orderer.with_identity(self.identity.clone())) as _)
                    }
                    Err(e) => {
                        warn!(channel = name, error = %e,
                            "failed to connect discovered orderers, using default");
                        self.orderer.clone()
                    }
                }
            }
            Ok(_) => self.orderer.clone(),
            Err(e) => {
                warn!(channel = name, error = %e, "channel discovery failed, using default orderer");
                self.orderer.clone()
            }
        }
    }

    /// Channel-binding hash from the first pooled peer with mutual TLS.
    fn pool_tls_cert_hash(&self) -> Option<Vec<u8>> {
        self.pool
            .peers()
            .into_values()
            .flatten()
            .find_map(|peer| peer.tls_cert_hash())
    }
}

/// Placeholder source for channels without any orderer; subscriptions fail
/// instead of hanging.
struct NoBlockSource;

#[async_trait]
impl BlockSource for NoBlockSource {
    async fn open(&self, _channel: &str, _seek: SeekFrom) -> Result<BlockStream> {
        Err(Error::OrdererNotDefined)
    }
}

fn connection_configs(endpoints: &[HostEndpoint]) -> Vec<ConnectionConfig> {
    endpoints
        .iter()
        .flat_map(|endpoint| &endpoint.host_addresses)
        .map(|host| ConnectionConfig {
            host: host.address.clone(),
            tls: host.tls.clone(),
            grpc: Default::default(),
        })
        .collect()
}

/// Builder-style construction of the [`Core`].
pub struct CoreBuilder {
    identity: Arc<SigningIdentity>,
    config: Option<Config>,
    config_path: Option<PathBuf>,
    crypto: Option<CryptoConfig>,
    suite: Option<Arc<dyn CryptoSuite>>,
    pool: Option<Arc<dyn PeerPool>>,
    orderer: Option<Arc<dyn Orderer>>,
    discovery: Option<Arc<dyn DiscoveryProvider>>,
    discovery_transport: Option<Arc<dyn DiscoveryTransport>>,
    extra_peers: Vec<(String, ConnectionConfig)>,
    endorsing_msps: Option<Vec<String>>,
}

impl CoreBuilder {
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Loads the YAML configuration at build time.
    pub fn with_config_yaml(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Crypto suite by registry name + options.
    pub fn with_crypto(mut self, crypto: CryptoConfig) -> Self {
        self.crypto = Some(crypto);
        self
    }

    pub fn with_crypto_suite(mut self, suite: Arc<dyn CryptoSuite>) -> Self {
        self.suite = Some(suite);
        self
    }

    pub fn with_pool(mut self, pool: Arc<dyn PeerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_orderer(mut self, orderer: Arc<dyn Orderer>) -> Self {
        self.orderer = Some(orderer);
        self
    }

    pub fn with_discovery_provider(mut self, provider: Arc<dyn DiscoveryProvider>) -> Self {
        self.discovery = Some(provider);
        self
    }

    /// Transport for the gossip discovery variant; required when the config
    /// selects `discovery.type: gossip`.
    pub fn with_discovery_transport(mut self, transport: Arc<dyn DiscoveryTransport>) -> Self {
        self.discovery_transport = Some(transport);
        self
    }

    /// Additional peers for one MSP on top of the configured set.
    pub fn with_peers(
        mut self,
        msp_id: impl Into<String>,
        peers: impl IntoIterator<Item = ConnectionConfig>,
    ) -> Self {
        let msp_id = msp_id.into();
        self.extra_peers
            .extend(peers.into_iter().map(|p| (msp_id.clone(), p)));
        self
    }

    /// MSPs asked for endorsement when an invocation names none.
    pub fn with_endorsing_msps<S: Into<String>>(
        mut self,
        msps: impl IntoIterator<Item = S>,
    ) -> Self {
        self.endorsing_msps = Some(msps.into_iter().map(Into::into).collect());
        self
    }

    pub async fn build(self) -> Result<Core> {
        let Self {
            identity,
            mut config,
            config_path,
            crypto,
            suite,
            pool,
            orderer,
            discovery,
            discovery_transport,
            extra_peers,
            endorsing_msps,
        } = self;

        if let Some(path) = config_path {
            config = Some(Config::from_yaml_file(path)?);
        }

        let suite = match suite {
            Some(suite) => suite,
            None => {
                let crypto = crypto.or_else(|| config.as_ref().and_then(|c| c.crypto.clone()));
                match crypto {
                    Some(cc) => hlf_crypto::get_suite(&cc.r#type, &cc.options)?,
                    None => hlf_crypto::default_suite(),
                }
            }
        };

        let pool: Arc<dyn PeerPool> = match pool {
            Some(pool) => pool,
            None => {
                if config.is_none() && extra_peers.is_empty() {
                    return Err(Error::EmptyConfig);
                }
                info!("initializing peer pool");
                let pool = Arc::new(MspPeerPool::new());
                if let Some(config) = &config {
                    for msp in &config.msp {
                        for endorser in &msp.endorsers {
                            let peer = GrpcPeer::new(endorser).await?;
                            pool.add(&msp.name, Arc::new(peer), LivenessCheck::grpc_default())?;
                        }
                    }
                }
                pool
            }
        };
        for (msp_id, peer_config) in &extra_peers {
            let peer = GrpcPeer::new(peer_config).await?;
            pool.add(msp_id, Arc::new(peer), LivenessCheck::grpc_default())?;
        }

        let discovery = match discovery {
            Some(provider) => Some(provider),
            None => match config.as_ref().and_then(|c| c.discovery.clone()) {
                Some(dc) => Some(build_discovery(
                    &dc,
                    config.as_ref().expect("discovery came from config"),
                    discovery_transport,
                )?),
                None => None,
            },
        };

        let orderer: Option<Arc<dyn Orderer>> = match orderer {
            Some(orderer) => Some(orderer),
            None => match config.as_ref().filter(|c| !c.orderers.is_empty()) {
                Some(c) => {
                    info!("initializing orderer");
                    let orderer = GrpcOrderer::new(&c.orderers)
                        .await?
                        .with_identity(identity.clone());
                    Some(Arc::new(orderer) as _)
                }
                None => None,
            },
        };

        let endorsing_msps = endorsing_msps
            .or_else(|| config.as_ref().map(|c| c.endorsing_msps.clone()))
            .unwrap_or_default();

        Ok(Core {
            identity,
            suite,
            pool,
            orderer,
            discovery,
            endorsing_msps,
            channels: Mutex::new(HashMap::new()),
        })
    }
}

fn build_discovery(
    dc: &DiscoveryConfig,
    config: &Config,
    transport: Option<Arc<dyn DiscoveryTransport>>,
) -> Result<Arc<dyn DiscoveryProvider>> {
    match dc.r#type.as_str() {
        LOCAL_DISCOVERY_TYPE => {
            info!("local discovery provider");
            Ok(Arc::new(LocalConfigProvider::new(config)))
        }
        GOSSIP_DISCOVERY_TYPE => {
            if dc.connection.is_none() {
                return Err(Error::InvalidConfig(
                    "discovery connection config was not provided; configure 'discovery.connection'"
                        .to_owned(),
                ));
            }
            let transport = transport.ok_or_else(|| {
                Error::InvalidConfig(
                    "gossip discovery requires an injected discovery transport".to_owned(),
                )
            })?;
            info!("gossip discovery provider");
            let mapper = TlsCertsMapper::new(config.tls_certs_map.clone());
            Ok(Arc::new(GossipProvider::new(transport, mapper)))
        }
        other => Err(Error::UnknownDiscoveryType(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_identity() -> Arc<SigningIdentity> {
        let suite = hlf_crypto::default_suite();
        let key = suite.new_private_key().unwrap();
        Arc::new(SigningIdentity::new("Org1MSP", vec![], key, suite).unwrap())
    }

    #[tokio::test]
    async fn build_without_config_or_pool_is_rejected() {
        let err = Core::builder(test_identity()).build().await.unwrap_err();
        assert!(matches!(err, Error::EmptyConfig));
    }

    #[tokio::test]
    async fn unknown_discovery_type_is_rejected() {
        let config = Config {
            discovery: Some(DiscoveryConfig {
                r#type: "dns".into(),
                options: serde_yaml::Value::Null,
                connection: None,
            }),
            ..Config::default()
        };
        let err = Core::builder(test_identity())
            .with_pool(Arc::new(MspPeerPool::new()))
            .with_config(config)
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownDiscoveryType(t) if t == "dns"));
    }

    #[tokio::test]
    async fn gossip_discovery_without_transport_is_rejected() {
        let config = Config {
            discovery: Some(DiscoveryConfig {
                r#type: GOSSIP_DISCOVERY_TYPE.into(),
                options: serde_yaml::Value::Null,
                connection: Some(ConnectionConfig::insecure("peer0:7051")),
            }),
            ..Config::default()
        };
        let err = Core::builder(test_identity())
            .with_pool(Arc::new(MspPeerPool::new()))
            .with_config(config)
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn unknown_crypto_suite_fails_construction() {
        let err = Core::builder(test_identity())
            .with_pool(Arc::new(MspPeerPool::new()))
            .with_crypto(CryptoConfig {
                r#type: "rot13".into(),
                options: serde_json::Value::Null,
            })
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Crypto(hlf_crypto::Error::UnknownSuite(_))));
    }
}
