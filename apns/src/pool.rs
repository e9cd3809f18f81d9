// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `GatewayPool` and `Sender`: fans a stream of outgoing messages out
//! to one `Connection` per certificate fingerprint, creating connections
//! lazily and holding them for the pool's lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use apns_core::{Certificate, Connection, FlushError, Message, MessageEnvelope};
use thiserror::Error;

use crate::factory::GatewayFactory;

/// Maps certificate fingerprint → `Connection`, building new connections
/// lazily via the injected [`GatewayFactory`]. Fingerprint
/// equality is the sole identity test: two `Certificate` values with the
/// same fingerprint always share one connection.
///
/// Not internally synchronized: sharing a pool across threads is the
/// caller's responsibility.
pub struct GatewayPool {
    factory: Arc<dyn GatewayFactory>,
    connections: HashMap<String, Connection>,
}

impl GatewayPool {
    pub fn new(factory: Arc<dyn GatewayFactory>) -> Self {
        Self {
            factory,
            connections: HashMap::new(),
        }
    }

    /// Number of distinct connections the pool has created so far.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The connection for `certificate`, building one on first use.
    pub fn connection_for(&mut self, certificate: &Certificate) -> &mut Connection {
        let factory = &self.factory;
        self.connections
            .entry(certificate.fingerprint().to_string())
            .or_insert_with(|| factory.build(certificate))
    }

    /// Sum of `queueLength()` across every connection the pool has created.
    pub fn queue_length(&self) -> usize {
        self.connections.values().map(Connection::queue_length).sum()
    }

    /// Flushes every connection the pool has ever created.
    pub async fn flush(&mut self) -> Result<(), FlushError> {
        for connection in self.connections.values_mut() {
            connection.flush().await?;
        }
        Ok(())
    }
}

/// Failure modes specific to `Sender`, layered over `Connection`'s own
/// `FlushError`.
#[derive(Debug, Error)]
pub enum SenderError {
    #[error("message carried no certificate and the sender has no default certificate configured")]
    NoCertificate,

    #[error(transparent)]
    Flush(#[from] FlushError),
}

/// The public entry point: `send` is the queue-then-flush-immediately
/// shortcut; `queue`/`flush` is the batch variant used to pipeline many
/// messages across many certificates before draining any of them.
pub struct Sender {
    pool: GatewayPool,
    default_certificate: Option<Certificate>,
}

impl Sender {
    pub fn new(factory: Arc<dyn GatewayFactory>) -> Self {
        Self {
            pool: GatewayPool::new(factory),
            default_certificate: None,
        }
    }

    pub fn with_default_certificate(mut self, certificate: Certificate) -> Self {
        self.default_certificate = Some(certificate);
        self
    }

    /// Queues `message` and flushes its connection immediately.
    pub async fn send(&mut self, message: Message) -> Result<MessageEnvelope, SenderError> {
        let envelope = self.queue(message)?;
        let certificate = self.resolve_certificate(envelope.message())?;
        let connection = self.pool.connection_for(&certificate);
        connection.flush().await?;
        Ok(connection
            .envelope(envelope.identifier())
            .cloned()
            .unwrap_or(envelope))
    }

    /// Queues `message` on the connection for its (or the sender's default)
    /// certificate without flushing.
    pub fn queue(&mut self, message: Message) -> Result<MessageEnvelope, SenderError> {
        let certificate = self.resolve_certificate(&message)?;
        let connection = self.pool.connection_for(&certificate);
        Ok(connection.queue(message))
    }

    /// Sum of `queueLength()` across every connection the pool has created.
    pub fn queue_length(&self) -> usize {
        self.pool.queue_length()
    }

    /// Flushes every connection the pool knows about.
    pub async fn flush(&mut self) -> Result<(), SenderError> {
        self.pool.flush().await?;
        Ok(())
    }

    /// Number of distinct certificate fingerprints the pool has built a
    /// connection for.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    fn resolve_certificate(&self, message: &Message) -> Result<Certificate, SenderError> {
        message
            .certificate()
            .or(self.default_certificate.as_ref())
            .cloned()
            .ok_or(SenderError::NoCertificate)
    }
}
