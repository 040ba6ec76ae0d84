// Copyright (c) 2024-2026 The HLF SDK Authors

//! ECDSA P-256 / SHA-256 suite, the default for Fabric-family networks.
//!
//! Signatures are DER-encoded and low-S normalized, matching what the
//! committing peers accept.

use std::any::Any;
use std::sync::Arc;

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{CryptoSuite, Error, KeyPair, Result};

pub const SUITE_NAME: &str = "ecdsa";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Options {
    #[serde(default = "default_curve")]
    curve: String,
    #[serde(default = "default_hash")]
    hash: String,
}

fn default_curve() -> String {
    "P256".to_owned()
}

fn default_hash() -> String {
    "SHA2-256".to_owned()
}

/// Registry entry point for the `ecdsa` suite.
pub fn factory(options: &serde_json::Value) -> Result<Arc<dyn CryptoSuite>> {
    if !options.is_null() {
        let opts: Options = serde_json::from_value(options.clone())
            .map_err(|e| Error::BadSuiteOptions(e.to_string()))?;
        if !matches!(opts.curve.as_str(), "P256" | "P-256") {
            return Err(Error::BadSuiteOptions(format!(
                "unsupported curve: {}",
                opts.curve
            )));
        }
        if !matches!(opts.hash.as_str(), "SHA2-256" | "SHA256") {
            return Err(Error::BadSuiteOptions(format!(
                "unsupported hash: {}",
                opts.hash
            )));
        }
    }
    Ok(Arc::new(EcdsaSuite))
}

pub struct EcdsaSuite;

/// A P-256 key held by [`EcdsaSuite`].
pub struct EcdsaKeyPair {
    signing_key: SigningKey,
}

impl EcdsaKeyPair {
    fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl KeyPair for EcdsaKeyPair {
    fn ski(&self) -> Vec<u8> {
        // Fabric convention: SHA-256 over the uncompressed EC point.
        let point = self.verifying_key().to_encoded_point(false);
        Sha256::digest(point.as_bytes()).to_vec()
    }

    fn public_key_der(&self) -> Result<Vec<u8>> {
        self.verifying_key()
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| Error::InvalidKey(e.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl CryptoSuite for EcdsaSuite {
    fn new_private_key(&self) -> Result<Box<dyn KeyPair>> {
        let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
        Ok(Box::new(EcdsaKeyPair { signing_key }))
    }

    fn key_from_pkcs8_der(&self, der: &[u8]) -> Result<Box<dyn KeyPair>> {
        let signing_key =
            SigningKey::from_pkcs8_der(der).map_err(|e| Error::InvalidKey(e.to_string()))?;
        Ok(Box::new(EcdsaKeyPair { signing_key }))
    }

    fn sign(&self, key: &dyn KeyPair, msg: &[u8]) -> Result<Vec<u8>> {
        let key = key
            .as_any()
            .downcast_ref::<EcdsaKeyPair>()
            .ok_or(Error::KeyMismatch)?;
        let signature: Signature = key
            .signing_key
            .try_sign(msg)
            .map_err(|e| Error::Signing(e.to_string()))?;
        // Peers reject high-S signatures.
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify(&self, public_key_der: &[u8], msg: &[u8], sig: &[u8]) -> Result<bool> {
        let verifying_key = VerifyingKey::from_public_key_der(public_key_der)
            .map_err(|e| Error::InvalidKey(e.to_string()))?;
        let signature = match Signature::from_der(sig) {
            Ok(signature) => signature,
            Err(_) => return Ok(false),
        };
        Ok(verifying_key.verify(msg, &signature).is_ok())
    }

    fn hash(&self, msg: &[u8]) -> Vec<u8> {
        Sha256::digest(msg).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite() -> Arc<dyn CryptoSuite> {
        factory(&serde_json::Value::Null).unwrap()
    }

    #[test]
    fn sign_verify_roundtrip() {
        let suite = suite();
        let key = suite.new_private_key().unwrap();
        let sig = suite.sign(key.as_ref(), b"endorse me").unwrap();
        let spki = key.public_key_der().unwrap();
        assert!(suite.verify(&spki, b"endorse me", &sig).unwrap());
        assert!(!suite.verify(&spki, b"endorse you", &sig).unwrap());
    }

    #[test]
    fn signatures_are_low_s() {
        let suite = suite();
        let key = suite.new_private_key().unwrap();
        for i in 0..16u8 {
            let der = suite.sign(key.as_ref(), &[i]).unwrap();
            let sig = Signature::from_der(&der).unwrap();
            assert!(sig.normalize_s().is_none(), "signature was not low-S");
        }
    }

    #[test]
    fn ski_is_stable() {
        let suite = suite();
        let key = suite.new_private_key().unwrap();
        assert_eq!(key.ski(), key.ski());
        assert_eq!(key.ski().len(), 32);
    }

    #[test]
    fn options_are_validated() {
        assert!(factory(&serde_json::json!({"curve": "P256"})).is_ok());
        let err = factory(&serde_json::json!({"curve": "P-384"})).unwrap_err();
        assert!(matches!(err, Error::BadSuiteOptions(_)));
        let err = factory(&serde_json::json!({"hash": "SHA3-256"})).unwrap_err();
        assert!(matches!(err, Error::BadSuiteOptions(_)));
    }
}
