// Copyright (c) 2024-2026 The HLF SDK Authors

//! The multiplexed connection handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper_util::rt::TokioIo;
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::tls::client_tls;

/// Hard cap on establishing a transport connection.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(2);

pub const MAX_RECV_MSG_SIZE: usize = 100 * 1024 * 1024;
pub const MAX_SEND_MSG_SIZE: usize = 100 * 1024 * 1024;

/// One logical client connection over a set of endpoints.
///
/// Every call to [`GrpcConnection::channel`] hands out the next endpoint's
/// channel in round-robin order, so concurrent callers spread load and a
/// failed call retried under the connection's [`RetryPolicy`] lands on the
/// next backend.
pub struct GrpcConnection {
    configs: Vec<ConnectionConfig>,
    endpoints: Vec<String>,
    channels: Vec<Channel>,
    next: AtomicUsize,
    tls_cert_hash: Option<Vec<u8>>,
    retry: RetryPolicy,
}

impl GrpcConnection {
    /// Connects to the given endpoint set. Resolves once any endpoint
    /// answers, or fails after the 2 s dial deadline; endpoints that were
    /// down at dial time are still part of the rotation and are redialed
    /// transparently per call.
    pub async fn connect(configs: &[ConnectionConfig]) -> Result<Self> {
        if configs.is_empty() {
            return Err(Error::NoEndpoints);
        }

        let retry = RetryPolicy::from(configs[0].grpc.retry.unwrap_or_default());

        let mut channels = Vec::with_capacity(configs.len());
        let mut endpoints = Vec::with_capacity(configs.len());
        let mut tls_cert_hash = None;
        for cfg in configs {
            let (channel, cert_hash) = lazy_channel(cfg)?;
            if tls_cert_hash.is_none() {
                tls_cert_hash = cert_hash;
            }
            endpoints.push(cfg.host.clone());
            channels.push(channel);
        }

        probe_any(configs).await?;
        debug!(endpoints = ?endpoints, "grpc connection established");

        Ok(Self {
            configs: configs.to_vec(),
            endpoints,
            channels,
            next: AtomicUsize::new(0),
            tls_cert_hash,
            retry,
        })
    }

    /// Re-runs the dial gate: succeeds while at least one endpoint answers
    /// within the dial deadline. Used as a liveness probe.
    pub async fn probe(&self) -> Result<()> {
        probe_any(&self.configs).await
    }

    /// Single-endpoint convenience.
    pub async fn connect_one(config: &ConnectionConfig) -> Result<Self> {
        Self::connect(std::slice::from_ref(config)).await
    }

    /// The next channel in the rotation.
    pub fn channel(&self) -> Channel {
        self.channels[self.next_index()].clone()
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// SHA-256 of the client TLS certificate, when mutual TLS is active;
    /// bound into proposal headers.
    pub fn tls_cert_hash(&self) -> Option<&[u8]> {
        self.tls_cert_hash.as_deref()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn next_index(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed) % self.channels.len()
    }

    #[cfg(test)]
    fn from_channels(endpoints: Vec<String>, channels: Vec<Channel>) -> Self {
        Self {
            configs: Vec::new(),
            endpoints,
            channels,
            next: AtomicUsize::new(0),
            tls_cert_hash: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl std::fmt::Debug for GrpcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcConnection")
            .field("endpoints", &self.endpoints)
            .field("mutual_tls", &self.tls_cert_hash.is_some())
            .finish_non_exhaustive()
    }
}

fn endpoint_for(cfg: &ConnectionConfig) -> Result<Endpoint> {
    let scheme = if cfg.tls.enabled { "https" } else { "http" };
    let keepalive = cfg.grpc.keepalive.unwrap_or_default();
    let endpoint = Endpoint::from_shared(format!("{scheme}://{}", cfg.host))
        .map_err(|_| Error::InvalidAddress(cfg.host.clone()))?
        .connect_timeout(DIAL_TIMEOUT)
        .http2_keep_alive_interval(Duration::from_secs(keepalive.time_secs))
        .keep_alive_timeout(Duration::from_secs(keepalive.timeout_secs))
        .keep_alive_while_idle(true);
    Ok(endpoint)
}

type TlsIo = TokioIo<tokio_rustls::client::TlsStream<TcpStream>>;
type Connector = tower::util::BoxCloneService<tonic::transport::Uri, TlsIo, std::io::Error>;

/// TLS handshaking happens in the connector so that skip-verify and custom
/// roots stay under our control; tonic only sees an established stream.
fn tls_connector(cfg: &ConnectionConfig) -> Result<(Connector, Option<Vec<u8>>)> {
    let material = client_tls(&cfg.tls)?;
    let connector = TlsConnector::from(Arc::new(material.client_config));
    let addr = cfg.host.clone();
    let server_name = ServerName::try_from(host_of(&cfg.host).to_owned())
        .map_err(|_| Error::InvalidAddress(cfg.host.clone()))?;

    let svc = tower::service_fn(move |_: tonic::transport::Uri| {
        let connector = connector.clone();
        let addr = addr.clone();
        let server_name = server_name.clone();
        async move {
            let tcp = TcpStream::connect(&addr).await?;
            tcp.set_nodelay(true)?;
            let tls = connector.connect(server_name, tcp).await?;
            Ok::<_, std::io::Error>(TokioIo::new(tls))
        }
    });

    Ok((tower::util::BoxCloneService::new(svc), material.cert_hash))
}

fn lazy_channel(cfg: &ConnectionConfig) -> Result<(Channel, Option<Vec<u8>>)> {
    let endpoint = endpoint_for(cfg)?;
    if cfg.tls.enabled {
        let (connector, cert_hash) = tls_connector(cfg)?;
        Ok((endpoint.connect_with_connector_lazy(connector), cert_hash))
    } else {
        Ok((endpoint.connect_lazy(), None))
    }
}

async fn eager_channel(cfg: &ConnectionConfig) -> Result<Channel> {
    let endpoint = endpoint_for(cfg)?;
    if cfg.tls.enabled {
        let (connector, _) = tls_connector(cfg)?;
        Ok(endpoint.connect_with_connector(connector).await?)
    } else {
        Ok(endpoint.connect().await?)
    }
}

/// Dial gate: at least one endpoint must accept a connection within
/// [`DIAL_TIMEOUT`]. The probe channels are dropped; the lazy rotation
/// channels redial on first use.
async fn probe_any(configs: &[ConnectionConfig]) -> Result<()> {
    let probes = configs
        .iter()
        .map(|cfg| Box::pin(eager_channel(cfg)))
        .collect::<Vec<_>>();
    match tokio::time::timeout(DIAL_TIMEOUT, futures::future::select_ok(probes)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(Error::DialFailed(e.to_string())),
        Err(_) => Err(Error::DialFailed(format!(
            "no endpoint answered within {DIAL_TIMEOUT:?}"
        ))),
    }
}

fn host_of(addr: &str) -> &str {
    addr.rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy(addr: &str) -> Channel {
        Endpoint::from_shared(format!("http://{addr}"))
            .unwrap()
            .connect_lazy()
    }

    #[tokio::test]
    async fn rotation_is_round_robin() {
        let conn = GrpcConnection::from_channels(
            vec!["a:7051".into(), "b:7051".into(), "c:7051".into()],
            vec![lazy("a:7051"), lazy("b:7051"), lazy("c:7051")],
        );
        let seq: Vec<usize> = (0..6).map(|_| conn.next_index()).collect();
        assert_eq!(seq, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn host_is_split_from_port() {
        assert_eq!(host_of("peer0.org1.example.com:7051"), "peer0.org1.example.com");
        assert_eq!(host_of("localhost"), "localhost");
    }

    #[tokio::test]
    async fn empty_endpoint_set_is_rejected() {
        let err = GrpcConnection::connect(&[]).await.unwrap_err();
        assert!(matches!(err, Error::NoEndpoints));
    }

    #[tokio::test]
    async fn dial_failure_surfaces_within_deadline() {
        // Nothing listens on this port; the dial gate must fail.
        let cfg = ConnectionConfig::insecure("127.0.0.1:1");
        let started = std::time::Instant::now();
        let err = GrpcConnection::connect_one(&cfg).await.unwrap_err();
        assert!(matches!(err, Error::DialFailed(_)));
        assert!(started.elapsed() < DIAL_TIMEOUT + Duration::from_secs(1));
    }
}
