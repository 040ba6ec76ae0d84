// Copyright (c) 2024-2026 The HLF SDK Authors

#![deny(unsafe_code)]

//! Pluggable cryptographic suites.
//!
//! A suite bundles key generation, signing, verification and hashing behind
//! one capability set so the rest of the SDK never names a curve or a hash
//! directly. Suites are looked up by name in a process-wide registry that is
//! populated at startup and read-only afterwards.
//!
//! # Examples
//!
//! ```
//! use hlf_crypto::{get_suite, ecdsa};
//!
//! let suite = get_suite(ecdsa::SUITE_NAME, &serde_json::json!({})).unwrap();
//! let key = suite.new_private_key().unwrap();
//! let sig = suite.sign(key.as_ref(), b"message").unwrap();
//! assert!(suite.verify(&key.public_key_der().unwrap(), b"message", &sig).unwrap());
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

pub mod ecdsa;

/// Errors produced by suite construction and use.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No suite with the requested name is registered.
    #[error("unknown crypto suite: {0}")]
    UnknownSuite(String),

    /// The suite rejected its options map.
    #[error("bad crypto suite options: {0}")]
    BadSuiteOptions(String),

    /// A key of a foreign suite was handed to this suite.
    #[error("key does not belong to this suite")]
    KeyMismatch,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// An opaque private key produced by a suite. Only the suite that created it
/// can sign with it.
pub trait KeyPair: Send + Sync {
    /// Subject Key Identifier: binds the key to its certificate in an MSP
    /// keystore.
    fn ski(&self) -> Vec<u8>;

    /// DER-encoded SubjectPublicKeyInfo of the public half.
    fn public_key_der(&self) -> Result<Vec<u8>>;

    fn as_any(&self) -> &dyn Any;
}

/// The capability set every suite provides.
pub trait CryptoSuite: Send + Sync {
    fn new_private_key(&self) -> Result<Box<dyn KeyPair>>;

    /// Parses a PKCS#8 DER private key (the conventional MSP keystore
    /// encoding).
    fn key_from_pkcs8_der(&self, der: &[u8]) -> Result<Box<dyn KeyPair>>;

    fn sign(&self, key: &dyn KeyPair, msg: &[u8]) -> Result<Vec<u8>>;

    /// Verifies `sig` over `msg` against a DER SubjectPublicKeyInfo.
    fn verify(&self, public_key_der: &[u8], msg: &[u8], sig: &[u8]) -> Result<bool>;

    fn hash(&self, msg: &[u8]) -> Vec<u8>;
}

impl std::fmt::Debug for dyn CryptoSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoSuite").finish_non_exhaustive()
    }
}

/// A factory takes the raw options map from configuration and returns a
/// ready suite, or [`Error::BadSuiteOptions`].
pub type SuiteFactory = fn(&serde_json::Value) -> Result<Arc<dyn CryptoSuite>>;

static REGISTRY: Lazy<RwLock<BTreeMap<String, SuiteFactory>>> = Lazy::new(|| {
    let mut suites: BTreeMap<String, SuiteFactory> = BTreeMap::new();
    suites.insert(ecdsa::SUITE_NAME.to_owned(), ecdsa::factory);
    RwLock::new(suites)
});

/// Registers an additional suite under `name`. Intended to be called during
/// process initialization, before any [`get_suite`] lookups; an existing
/// registration is never replaced.
pub fn register_suite(name: &str, factory: SuiteFactory) {
    let mut registry = REGISTRY.write().expect("crypto suite registry poisoned");
    registry.entry(name.to_owned()).or_insert(factory);
}

/// Looks up a suite by name and constructs it with the given options.
pub fn get_suite(name: &str, options: &serde_json::Value) -> Result<Arc<dyn CryptoSuite>> {
    let factory = {
        let registry = REGISTRY.read().expect("crypto suite registry poisoned");
        registry
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSuite(name.to_owned()))?
    };
    factory(options)
}

/// The suite the SDK uses when configuration names none.
pub fn default_suite() -> Arc<dyn CryptoSuite> {
    get_suite(ecdsa::SUITE_NAME, &serde_json::Value::Null)
        .expect("builtin ecdsa suite must construct with empty options")
}
