// Copyright (c) 2024-2026 The HLF SDK Authors

#![deny(unsafe_code)]

//! Signing identities materialized from a local MSP directory.
//!
//! The conventional layout is
//!
//! ```text
//! <msp>/
//!   signcerts/   single signing certificate (PEM)
//!   keystore/    private keys; the one whose SKI matches the signcert wins
//!   cacerts/     identity trust roots
//!   tlscacerts/  TLS trust roots
//!   admincerts/  admin certificates (optional)
//! ```

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use prost::Message;
use rustls_pki_types::PrivateKeyDer;
use sha2::{Digest, Sha256};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use hlf_crypto::{CryptoSuite, KeyPair};
use hlf_protos::msp::SerializedIdentity;

mod msp;

pub use msp::Msp;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Construction was attempted without an MSP identifier.
    #[error("MSP ID is empty")]
    MspIdEmpty,

    /// Construction was attempted without an MSP directory.
    #[error("MSP path is empty")]
    MspPathEmpty,

    /// No signing certificate, or no keystore entry matching its SKI.
    #[error("signer not found in {0}")]
    SignerNotFound(PathBuf),

    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("bad certificate in {path}: {reason}")]
    BadCertificate { path: PathBuf, reason: String },

    #[error(transparent)]
    Crypto(#[from] hlf_crypto::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A loaded identity: MSP id, signing certificate and the matching private
/// key. Immutable once constructed; safe to share via [`Arc`].
pub struct SigningIdentity {
    msp_id: String,
    cert_pem: Vec<u8>,
    key: Box<dyn KeyPair>,
    suite: Arc<dyn CryptoSuite>,
}

impl SigningIdentity {
    pub fn new(
        msp_id: impl Into<String>,
        cert_pem: Vec<u8>,
        key: Box<dyn KeyPair>,
        suite: Arc<dyn CryptoSuite>,
    ) -> Result<Self> {
        let msp_id = msp_id.into();
        if msp_id.is_empty() {
            return Err(Error::MspIdEmpty);
        }
        Ok(Self {
            msp_id,
            cert_pem,
            key,
            suite,
        })
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    /// PEM-encoded signing certificate.
    pub fn cert_pem(&self) -> &[u8] {
        &self.cert_pem
    }

    /// The wire form: a marshaled `msp.SerializedIdentity`.
    pub fn serialize(&self) -> Vec<u8> {
        SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: self.cert_pem.clone(),
        }
        .encode_to_vec()
    }

    pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        Ok(self.suite.sign(self.key.as_ref(), msg)?)
    }

    pub fn suite(&self) -> &Arc<dyn CryptoSuite> {
        &self.suite
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("msp_id", &self.msp_id)
            .finish_non_exhaustive()
    }
}

/// SKI of an X.509 certificate's public key: SHA-256 over the raw
/// subject-public-key bits (the uncompressed point, for EC keys).
pub(crate) fn cert_ski(cert_der: &[u8], path: &Path) -> Result<Vec<u8>> {
    let (_, cert) =
        X509Certificate::from_der(cert_der).map_err(|e| Error::BadCertificate {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let spk = &cert.public_key().subject_public_key;
    Ok(Sha256::digest(spk.data.as_ref()).to_vec())
}

/// Reads every certificate from a PEM file.
pub(crate) fn certs_from_pem(path: &Path) -> Result<Vec<Vec<u8>>> {
    let file = fs::File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    rustls_pemfile::certs(&mut BufReader::new(file))
        .map(|cert| {
            cert.map(|der| der.as_ref().to_vec())
                .map_err(|e| Error::BadCertificate {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Reads the first PKCS#8 private key from a PEM file, if any.
pub(crate) fn key_from_pem(path: &Path) -> Result<Option<Vec<u8>>> {
    let file = fs::File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(file)).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(key.map(|key| match key {
        PrivateKeyDer::Pkcs8(k) => k.secret_pkcs8_der().to_vec(),
        other => other.secret_der().to_vec(),
    }))
}

pub(crate) fn sorted_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixture helpers shared by this crate's tests.

    use std::fs;
    use std::path::Path;

    use rcgen::{CertificateParams, KeyPair, PKCS_ECDSA_P256_SHA256};

    /// Generates a throwaway P-256 identity and writes the conventional MSP
    /// layout under `root`.
    pub fn write_msp_dir(root: &Path) -> (String, String) {
        let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).unwrap();
        let cert = CertificateParams::new(vec!["peer0.org1.example.com".into()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap();

        let cert_pem = cert.pem();
        let key_pem = key_pair.serialize_pem();

        for sub in ["signcerts", "keystore", "cacerts", "tlscacerts", "admincerts"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        fs::write(root.join("signcerts/cert.pem"), &cert_pem).unwrap();
        fs::write(root.join("keystore/priv_sk"), &key_pem).unwrap();
        fs::write(root.join("cacerts/ca.pem"), &cert_pem).unwrap();
        fs::write(root.join("tlscacerts/tlsca.pem"), &cert_pem).unwrap();

        (cert_pem, key_pem)
    }
}
