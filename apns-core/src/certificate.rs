// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The `Certificate` collaborator: an opaque identity exposing a
//! fingerprint, a gateway endpoint, and PEM-encoded TLS material. Parsing
//! PKCS#12 or validating issuer/expiry is out of scope — the
//! caller hands us already-decoded PEM bytes.

use std::path::Path;
use std::sync::Arc;

use rustls_pki_types::{CertificateDer, PrivateKeyDer};

/// Which APNS gateway a certificate's connections should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    /// `host:port` of the legacy binary push gateway for this environment.
    pub fn endpoint(self) -> (&'static str, u16) {
        match self {
            Environment::Production => ("gateway.push.apple.com", 2195),
            Environment::Sandbox => ("gateway.sandbox.push.apple.com", 2195),
        }
    }
}

/// A client identity: certificate chain + private key, bound to an
/// environment, identified by a stable fingerprint used as the pool's
/// connection-identity key.
#[derive(Clone)]
pub struct Certificate {
    fingerprint: Arc<str>,
    environment: Environment,
    chain: Arc<[CertificateDer<'static>]>,
    key: Arc<PrivateKeyDerWrapper>,
    has_passphrase: bool,
}

/// `PrivateKeyDer` does not implement `Clone`; wrap it so `Certificate`
/// itself can be cheaply cloned (it is shared between the pool and each
/// `Connection` built for it).
struct PrivateKeyDerWrapper(PrivateKeyDer<'static>);

impl Certificate {
    /// Builds a certificate identity from already-decoded PEM bytes.
    ///
    /// `pem_bytes` must contain the leaf certificate (and any intermediates)
    /// followed by exactly one unencrypted private key, all PEM-encoded.
    /// Encrypted PEM private keys are not supported (see `DESIGN.md`).
    pub fn from_pem(
        fingerprint: impl Into<Arc<str>>,
        environment: Environment,
        pem_bytes: &[u8],
    ) -> Result<Self, CertificateError> {
        let mut reader = std::io::Cursor::new(pem_bytes);
        let chain: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
            .collect::<Result<_, _>>()
            .map_err(CertificateError::Pem)?;
        if chain.is_empty() {
            return Err(CertificateError::MissingCertificate);
        }

        let mut reader = std::io::Cursor::new(pem_bytes);
        let key = rustls_pemfile::private_key(&mut reader)
            .map_err(CertificateError::Pem)?
            .ok_or(CertificateError::MissingPrivateKey)?;

        Ok(Self {
            fingerprint: fingerprint.into(),
            environment,
            chain: chain.into(),
            key: Arc::new(PrivateKeyDerWrapper(key)),
            has_passphrase: false,
        })
    }

    /// Convenience constructor reading PEM bytes from a file path.
    pub fn from_pem_file(
        fingerprint: impl Into<Arc<str>>,
        environment: Environment,
        path: impl AsRef<Path>,
    ) -> Result<Self, CertificateError> {
        let bytes = std::fs::read(path).map_err(CertificateError::Io)?;
        Self::from_pem(fingerprint, environment, &bytes)
    }

    /// Marks this identity's private key as originating from a
    /// passphrase-protected source. This crate does not decrypt PEM keys
    /// itself (the caller must hand over already-decrypted material); the
    /// flag exists purely for interface symmetry with the spec's
    /// `hasPassphrase()` contract.
    pub fn with_passphrase_flag(mut self, has_passphrase: bool) -> Self {
        self.has_passphrase = has_passphrase;
        self
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn endpoint(&self) -> (&'static str, u16) {
        self.environment.endpoint()
    }

    pub fn has_passphrase(&self) -> bool {
        self.has_passphrase
    }

    pub(crate) fn chain(&self) -> Vec<CertificateDer<'static>> {
        self.chain.to_vec()
    }

    pub(crate) fn key(&self) -> PrivateKeyDer<'static> {
        self.key.0.clone_key()
    }

    /// Builds an identity with placeholder, never-dialed chain/key bytes.
    /// Only usable by `Connection` unit tests that exercise `queue`/`flush`
    /// bookkeeping against a dialer that never actually performs a TLS
    /// handshake; `rustls_pki_types`'s DER wrappers don't validate their
    /// contents at construction time, so this never needs a real key.
    #[cfg(test)]
    pub(crate) fn test_only(fingerprint: impl Into<Arc<str>>, environment: Environment) -> Self {
        use rustls_pki_types::PrivatePkcs8KeyDer;

        Self {
            fingerprint: fingerprint.into(),
            environment,
            chain: Arc::from(vec![CertificateDer::from(vec![0u8; 1])]),
            key: Arc::new(PrivateKeyDerWrapper(PrivateKeyDer::Pkcs8(
                PrivatePkcs8KeyDer::from(vec![0u8; 1]),
            ))),
            has_passphrase: false,
        }
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("fingerprint", &self.fingerprint)
            .field("environment", &self.environment)
            .field("has_passphrase", &self.has_passphrase)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("failed to read certificate file: {0}")]
    Io(#[source] std::io::Error),
    #[error("failed to parse PEM material: {0}")]
    Pem(#[source] std::io::Error),
    #[error("PEM material contained no certificate")]
    MissingCertificate,
    #[error("PEM material contained no private key")]
    MissingPrivateKey,
}
