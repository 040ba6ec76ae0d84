// Copyright (c) 2024-2026 The HLF SDK Authors

//! Loader for the conventional local MSP directory layout.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use hlf_crypto::CryptoSuite;

use crate::{cert_ski, certs_from_pem, key_from_pem, sorted_files, Error, Result, SigningIdentity};

const SIGNCERTS: &str = "signcerts";
const KEYSTORE: &str = "keystore";
const CACERTS: &str = "cacerts";
const TLSCACERTS: &str = "tlscacerts";
const ADMINCERTS: &str = "admincerts";

/// An MSP materialized from disk: the signing identity plus the trust-root
/// certificate sets.
pub struct Msp {
    signer: SigningIdentity,
    ca_certs: Vec<Vec<u8>>,
    tls_ca_certs: Vec<Vec<u8>>,
    admin_certs: Vec<Vec<u8>>,
}

impl std::fmt::Debug for Msp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Msp").finish_non_exhaustive()
    }
}

impl Msp {
    /// Loads the MSP rooted at `path`.
    ///
    /// The signing certificate is the first parseable PEM under
    /// `signcerts/`; the private key is the keystore entry whose SKI
    /// matches that certificate's public key.
    pub fn from_path(
        msp_id: impl Into<String>,
        path: impl AsRef<Path>,
        suite: Arc<dyn CryptoSuite>,
    ) -> Result<Self> {
        let msp_id = msp_id.into();
        if msp_id.is_empty() {
            return Err(Error::MspIdEmpty);
        }
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::MspPathEmpty);
        }

        let (cert_pem, cert_der) = load_signcert(&path.join(SIGNCERTS))
            .ok_or_else(|| Error::SignerNotFound(path.to_path_buf()))?;
        let want_ski = cert_ski(&cert_der, path)?;

        let key = find_keystore_match(&path.join(KEYSTORE), &want_ski, suite.as_ref())
            .ok_or_else(|| Error::SignerNotFound(path.to_path_buf()))?;

        debug!(msp_id = %msp_id, path = %path.display(), "loaded MSP signer");

        Ok(Self {
            signer: SigningIdentity::new(msp_id, cert_pem, key, suite)?,
            ca_certs: load_cert_dir(&path.join(CACERTS))?,
            tls_ca_certs: load_cert_dir(&path.join(TLSCACERTS))?,
            admin_certs: load_cert_dir(&path.join(ADMINCERTS))?,
        })
    }

    pub fn msp_id(&self) -> &str {
        self.signer.msp_id()
    }

    pub fn signer(&self) -> &SigningIdentity {
        &self.signer
    }

    pub fn into_signer(self) -> SigningIdentity {
        self.signer
    }

    /// Identity trust roots, DER-encoded.
    pub fn ca_certs(&self) -> &[Vec<u8>] {
        &self.ca_certs
    }

    /// TLS trust roots, DER-encoded.
    pub fn tls_ca_certs(&self) -> &[Vec<u8>] {
        &self.tls_ca_certs
    }

    /// Admin certificates, DER-encoded. Empty on post-1.4 layouts.
    pub fn admin_certs(&self) -> &[Vec<u8>] {
        &self.admin_certs
    }
}

/// Returns the PEM file bytes and the DER of the first certificate found
/// under the signcerts directory.
fn load_signcert(dir: &Path) -> Option<(Vec<u8>, Vec<u8>)> {
    for file in sorted_files(dir) {
        match certs_from_pem(&file) {
            Ok(certs) if !certs.is_empty() => {
                let pem = fs::read(&file).ok()?;
                return Some((pem, certs.into_iter().next().unwrap()));
            }
            Ok(_) => {}
            Err(e) => debug!(file = %file.display(), error = %e, "skipping signcert entry"),
        }
    }
    None
}

fn find_keystore_match(
    dir: &Path,
    want_ski: &[u8],
    suite: &dyn CryptoSuite,
) -> Option<Box<dyn hlf_crypto::KeyPair>> {
    for file in sorted_files(dir) {
        let der = match key_from_pem(&file) {
            Ok(Some(der)) => der,
            Ok(None) => continue,
            Err(e) => {
                debug!(file = %file.display(), error = %e, "skipping keystore entry");
                continue;
            }
        };
        match suite.key_from_pkcs8_der(&der) {
            Ok(key) if key.ski() == want_ski => return Some(key),
            Ok(_) => {}
            Err(e) => debug!(file = %file.display(), error = %e, "skipping keystore entry"),
        }
    }
    None
}

/// Collects every certificate under `dir`; a missing directory is an empty
/// set.
fn load_cert_dir(dir: &Path) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::new();
    for file in sorted_files(dir) {
        out.extend(certs_from_pem(&file)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_msp_dir;

    use rcgen::{KeyPair as RcgenKeyPair, PKCS_ECDSA_P256_SHA256};

    #[test]
    fn loads_signer_with_matching_ski() {
        let dir = tempfile::tempdir().unwrap();
        write_msp_dir(dir.path());

        let suite = hlf_crypto::default_suite();
        let msp = Msp::from_path("Org1MSP", dir.path(), suite.clone()).unwrap();

        assert_eq!(msp.msp_id(), "Org1MSP");
        assert_eq!(msp.ca_certs().len(), 1);
        assert_eq!(msp.tls_ca_certs().len(), 1);

        let sig = msp.signer().sign(b"payload").unwrap();
        assert!(!sig.is_empty());
    }

    #[test]
    fn empty_msp_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Msp::from_path("", dir.path(), hlf_crypto::default_suite()).unwrap_err();
        assert!(matches!(err, Error::MspIdEmpty));
    }

    #[test]
    fn empty_path_fails() {
        let err = Msp::from_path("Org1MSP", "", hlf_crypto::default_suite()).unwrap_err();
        assert!(matches!(err, Error::MspPathEmpty));
    }

    #[test]
    fn missing_signcert_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("signcerts")).unwrap();
        let err = Msp::from_path("Org1MSP", dir.path(), hlf_crypto::default_suite()).unwrap_err();
        assert!(matches!(err, Error::SignerNotFound(_)));
    }

    #[test]
    fn mismatched_keystore_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_msp_dir(dir.path());

        // Replace the keystore entry with a key unrelated to the signcert.
        let other = RcgenKeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).unwrap();
        std::fs::write(dir.path().join("keystore/priv_sk"), other.serialize_pem()).unwrap();

        let err = Msp::from_path("Org1MSP", dir.path(), hlf_crypto::default_suite()).unwrap_err();
        assert!(matches!(err, Error::SignerNotFound(_)));
    }
}
