// Copyright (c) 2024-2026 The HLF SDK Authors

//! rustls client configuration assembly for endpoint TLS blocks.

use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::RootCertStore;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::TlsConfig;
use crate::error::{Error, Result};

/// The value carried in `ChannelHeader.tls_cert_hash` for channel binding:
/// SHA-256 over the client certificate DER.
pub fn tls_cert_hash(cert_der: &[u8]) -> Vec<u8> {
    Sha256::digest(cert_der).to_vec()
}

pub(crate) struct TlsMaterial {
    pub client_config: rustls::ClientConfig,
    /// SHA-256 of the first client certificate, when mutual TLS is on.
    pub cert_hash: Option<Vec<u8>>,
}

pub(crate) fn client_tls(cfg: &TlsConfig) -> Result<TlsMaterial> {
    let roots = build_roots(cfg)?;
    let builder = rustls::ClientConfig::builder().with_root_certificates(roots);

    let (mut client_config, cert_hash) = match (&cfg.cert_path, &cfg.key_path) {
        (Some(cert_path), Some(key_path)) => {
            let certs = read_certs(cert_path)?;
            let key = read_key(key_path)?;
            let hash = certs.first().map(|cert| tls_cert_hash(cert.as_ref()));
            let config = builder
                .with_client_auth_cert(certs, key)
                .map_err(|e| Error::Tls(e.to_string()))?;
            (config, hash)
        }
        _ => (builder.with_no_client_auth(), None),
    };

    if cfg.skip_verify {
        client_config
            .dangerous()
            .set_certificate_verifier(Arc::new(SkipServerVerification));
    }

    client_config.alpn_protocols = vec![b"h2".to_vec()];

    Ok(TlsMaterial {
        client_config,
        cert_hash,
    })
}

fn build_roots(cfg: &TlsConfig) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    match &cfg.ca_cert_path {
        Some(path) => {
            for cert in read_certs(path)? {
                roots
                    .add(cert)
                    .map_err(|e| Error::Tls(format!("CA bundle {}: {e}", path.display())))?;
            }
        }
        None => {
            let loaded = rustls_native_certs::load_native_certs();
            for err in &loaded.errors {
                warn!(error = %err, "skipping unreadable system root");
            }
            for cert in loaded.certs {
                // Tolerate individual bad roots in the system store.
                let _ = roots.add(cert);
            }
        }
    }
    Ok(roots)
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = fs::File::open(path)
        .map_err(|e| Error::Tls(format!("read {}: {e}", path.display())))?;
    rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("parse {}: {e}", path.display())))
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = fs::File::open(path)
        .map_err(|e| Error::Tls(format!("read {}: {e}", path.display())))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| Error::Tls(format!("parse {}: {e}", path.display())))?
        .ok_or_else(|| Error::Tls(format!("no private key in {}", path.display())))
}

/// Accepts any server chain; used when `skip_verify` is configured.
#[derive(Debug)]
struct SkipServerVerification;

impl rustls::client::danger::ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cert_hash_is_sha256() {
        let hash = tls_cert_hash(b"certificate der bytes");
        assert_eq!(hash.len(), 32);
        assert_eq!(hash, Sha256::digest(b"certificate der bytes").to_vec());
    }

    #[test]
    fn mutual_tls_exposes_cert_hash() {
        let dir = tempfile::tempdir().unwrap();
        let key = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let cert = rcgen::CertificateParams::new(vec!["client.example.com".into()])
            .unwrap()
            .self_signed(&key)
            .unwrap();

        let cert_path = dir.path().join("client.pem");
        let key_path = dir.path().join("client.key");
        let ca_path = dir.path().join("ca.pem");
        std::fs::write(&cert_path, cert.pem()).unwrap();
        std::fs::write(&key_path, key.serialize_pem()).unwrap();
        std::fs::write(&ca_path, cert.pem()).unwrap();

        let material = client_tls(&TlsConfig {
            enabled: true,
            skip_verify: false,
            ca_cert_path: Some(ca_path),
            cert_path: Some(cert_path),
            key_path: Some(key_path),
        })
        .unwrap();

        assert_eq!(
            material.cert_hash,
            Some(tls_cert_hash(cert.der().as_ref()))
        );
    }
}
