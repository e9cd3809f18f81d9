// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `GatewayFactory`: the injected capability `GatewayPool` uses to
//! produce a `Connection` per certificate fingerprint. Production code uses
//! [`TlsGatewayFactory`]; a test double substitutes a `Dialer` that hands out
//! an in-memory duplex stream instead of dialing the real gateway.

use std::sync::Arc;

use apns_core::{Certificate, ClientConfig, Connection, Dialer, TlsDialer};

/// Produces `Connection` instances for a certificate.
pub trait GatewayFactory: Send + Sync {
    fn build(&self, certificate: &Certificate) -> Connection;
}

/// The production factory: every connection it builds dials the real APNS
/// gateway over TLS via a shared [`TlsDialer`] (so the root certificate
/// store is parsed once, not per connection).
pub struct TlsGatewayFactory {
    dialer: Arc<dyn Dialer>,
    config: ClientConfig,
}

impl TlsGatewayFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            dialer: Arc::new(TlsDialer::new()),
            config,
        }
    }
}

impl Default for TlsGatewayFactory {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl GatewayFactory for TlsGatewayFactory {
    fn build(&self, certificate: &Certificate) -> Connection {
        tracing::debug!(
            fingerprint = certificate.fingerprint(),
            "building a connection for a new certificate fingerprint"
        );
        Connection::new(certificate.clone(), self.config.clone(), self.dialer.clone())
    }
}
