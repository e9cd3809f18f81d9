// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `MessageEnvelope`: the mutable tracker a `Connection` attaches to
//! each queued `Message`.

use crate::message::Message;

/// The terminal (or pending) outcome of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStatus {
    /// Initial state; not yet written or locally rejected.
    Pending,
    /// Fully written to the socket. Not a delivery guarantee — APNS may
    /// still report this envelope as failing later, which retroactively
    /// moves it to `EarlierError`.
    NoErrors,
    /// Failed local validation; never reached the wire.
    PayloadTooLong,
    /// Transport short-write; a retry envelope with a new identifier has
    /// been enqueued.
    SendFailed,
    /// Written after a server-rejected envelope on the same connection and
    /// therefore silently dropped; a retry envelope has been enqueued.
    EarlierError,
    /// The literal status byte APNS reported in an error frame.
    ServerStatus(u8),
}

impl EnvelopeStatus {
    /// `true` for any status other than `Pending`. A terminal status is
    /// set exactly once per envelope.
    pub fn is_terminal(self) -> bool {
        !matches!(self, EnvelopeStatus::Pending)
    }

    /// `true` for the two statuses that carry a `retry_identifier` chain.
    pub fn is_retried(self) -> bool {
        matches!(
            self,
            EnvelopeStatus::SendFailed | EnvelopeStatus::EarlierError
        )
    }
}

/// A mutable tracker bound to one `Message` for the lifetime of its owning
/// `Connection`. Lives in `inFlight` forever, even after the message is
/// fully resolved, so selective resend can walk it by identifier.
#[derive(Clone)]
pub struct MessageEnvelope {
    identifier: u32,
    message: Message,
    status: EnvelopeStatus,
    /// Set iff this envelope was superseded by a resend; the successor is
    /// looked up by identifier in `inFlight` rather than owned directly,
    /// since `inFlight` is the single owner of every envelope on a
    /// connection.
    retry_identifier: Option<u32>,
}

impl MessageEnvelope {
    pub(crate) fn new(identifier: u32, message: Message) -> Self {
        Self {
            identifier,
            message,
            status: EnvelopeStatus::Pending,
            retry_identifier: None,
        }
    }

    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn status(&self) -> EnvelopeStatus {
        self.status
    }

    pub fn retry_identifier(&self) -> Option<u32> {
        self.retry_identifier
    }

    pub(crate) fn set_status(&mut self, status: EnvelopeStatus) {
        self.status = status;
    }

    pub(crate) fn set_retry(&mut self, retry_identifier: u32, status: EnvelopeStatus) {
        self.retry_identifier = Some(retry_identifier);
        self.status = status;
    }
}
