// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `Connection`: one TLS socket per certificate fingerprint, pipelining
//! writes while interleaving opportunistic reads for APNS's asynchronous,
//! unsolicited error frame, and performing selective resend of whatever was
//! silently dropped after a rejection.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::certificate::Certificate;
use crate::config::ClientConfig;
use crate::dialer::Dialer;
use crate::envelope::{EnvelopeStatus, MessageEnvelope};
use crate::error::{ConnectError, FlushError, ProtocolError};
use crate::frame::{ErrorFrame, ERROR_FRAME_LEN};
use crate::inflight::InFlightTable;
use crate::message::Message;
use crate::socket::BoxedSocket;

/// The opportunistic, mid-batch poll for a trailing error frame never
/// blocks the flush loop; it only observes frames the server has
/// already landed in the socket buffer by the time we check.
const OPPORTUNISTIC_POLL_TIMEOUT: Duration = Duration::ZERO;

/// One APNS gateway connection for one certificate fingerprint.
/// Not safe for concurrent use: all methods take `&mut self`.
pub struct Connection {
    certificate: Certificate,
    config: ClientConfig,
    dialer: Arc<dyn Dialer>,
    socket: Option<BoxedSocket>,
    last_identifier: u32,
    in_flight: InFlightTable,
    send_queue: VecDeque<u32>,
}

impl Connection {
    pub fn new(certificate: Certificate, config: ClientConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            certificate,
            config,
            dialer,
            socket: None,
            last_identifier: 0,
            in_flight: InFlightTable::new(),
            send_queue: VecDeque::new(),
        }
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// `true` while a socket is open.
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Looks up an envelope's current state by identifier, e.g. to inspect
    /// the terminal status after `flush()` returns.
    pub fn envelope(&self, identifier: u32) -> Option<&MessageEnvelope> {
        self.in_flight.get(identifier)
    }

    /// Assigns the next identifier and queues `message`.
    /// Oversized payloads are rejected locally and never touch `sendQueue`.
    pub fn queue(&mut self, message: Message) -> MessageEnvelope {
        let valid = message.validate_length();
        let identifier = self.insert_new_envelope(message);
        if valid {
            self.send_queue.push_back(identifier);
        } else {
            self.in_flight
                .get_mut(identifier)
                .expect("just inserted")
                .set_status(EnvelopeStatus::PayloadTooLong);
            tracing::warn!(identifier, "payload exceeds legacy frame limit, not queued");
        }
        self.in_flight.get(identifier).expect("just inserted").clone()
    }

    /// Size of `sendQueue`, not `inFlight`.
    pub fn queue_length(&self) -> usize {
        self.send_queue.len()
    }

    /// Closes the socket if present. Always safe to call.
    pub fn disconnect(&mut self) {
        if self.socket.take().is_some() {
            tracing::debug!(
                fingerprint = self.certificate.fingerprint(),
                "disconnected from apns gateway"
            );
        }
    }

    async fn connect(&mut self) -> Result<(), ConnectError> {
        if self.socket.is_some() {
            return Ok(());
        }
        tracing::debug!(
            fingerprint = self.certificate.fingerprint(),
            "connecting to apns gateway"
        );
        let socket = self
            .dialer
            .connect(&self.certificate, self.config.connect_timeout)
            .await?;
        self.socket = Some(socket);
        Ok(())
    }

    /// Drains `sendQueue`, recovering from APNS's failure protocol as
    /// necessary, and returns once the queue is empty and a trailing
    /// post-drain window has elapsed quietly.
    ///
    /// A no-op on an empty queue: no socket I/O at all.
    pub async fn flush(&mut self) -> Result<(), FlushError> {
        if self.send_queue.is_empty() {
            return Ok(());
        }

        for _ in 0..self.config.max_flush_rounds {
            self.drain_send_queue().await?;
            (self.config.yield_point)().await;

            match self.poll_error_frame(self.config.post_drain_window).await? {
                Some(frame) => {
                    self.handle_error_frame(frame).await?;
                    // recovery may have requeued the dropped tail; loop
                    // around so the outer round re-enters drain_send_queue.
                }
                None => return Ok(()),
            }
        }

        Err(FlushError::TooManyRecoveryRounds(self.config.max_flush_rounds))
    }

    async fn drain_send_queue(&mut self) -> Result<(), FlushError> {
        while let Some(identifier) = self.send_queue.pop_front() {
            self.connect().await?;

            let message = self
                .in_flight
                .get(identifier)
                .expect("queued identifier must be in_flight")
                .message()
                .clone();
            let frame = message.binary_encode(identifier);

            let written = self.write_frame(&frame).await?;
            if written < frame.len() {
                tracing::warn!(identifier, written, expected = frame.len(), "short write, resending");
                self.requeue(identifier, message, EnvelopeStatus::SendFailed);
            } else {
                self.in_flight
                    .get_mut(identifier)
                    .expect("just looked up")
                    .set_status(EnvelopeStatus::NoErrors);
                tracing::debug!(identifier, "wrote frame");
            }

            tokio::time::sleep(self.config.inter_send_pause).await;

            if let Some(frame) = self.poll_error_frame(OPPORTUNISTIC_POLL_TIMEOUT).await? {
                self.handle_error_frame(frame).await?;
            }

            (self.config.yield_point)().await;
        }
        Ok(())
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<usize, std::io::Error> {
        let socket = self
            .socket
            .as_mut()
            .expect("connect() must have run before a write is attempted");
        socket.write(frame).await
    }

    /// Reads a 6-byte error frame if one is fully available within
    /// `timeout`; `None` if nothing arrived in time.
    async fn poll_error_frame(&mut self, timeout: Duration) -> Result<Option<ErrorFrame>, FlushError> {
        let Some(socket) = self.socket.as_mut() else {
            return Ok(None);
        };

        let mut bytes = [0u8; ERROR_FRAME_LEN];
        let outcome = tokio::time::timeout(timeout, socket.read_exact(&mut bytes)).await;

        // Any failure here — a malformed frame, a truncated read, a raw I/O
        // error — leaves the connection unable to make progress, so we
        // always disconnect before surfacing it; a clean "nothing arrived
        // yet" timeout is the only outcome that leaves the socket alone.
        match outcome {
            Err(_elapsed) => Ok(None),
            Ok(Ok(_)) => match ErrorFrame::decode(&bytes) {
                Ok(frame) => Ok(Some(frame)),
                Err(err) => {
                    self.disconnect();
                    Err(FlushError::from(err))
                }
            },
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.disconnect();
                Err(FlushError::from(ProtocolError::TruncatedFrame {
                    expected: ERROR_FRAME_LEN,
                }))
            }
            Ok(Err(err)) => {
                self.disconnect();
                Err(FlushError::from(ProtocolError::from(err)))
            }
        }
    }

    /// Error recovery: rejects the named envelope, marks and
    /// resends everything written after it that was still `NoErrors`
    /// (silently dropped by APNS), and reconnects before the next write.
    async fn handle_error_frame(&mut self, frame: ErrorFrame) -> Result<(), FlushError> {
        tracing::warn!(
            identifier = frame.identifier,
            status = frame.status,
            "apns reported a failing envelope"
        );
        self.disconnect();

        match self.in_flight.get_mut(frame.identifier) {
            Some(envelope) => envelope.set_status(EnvelopeStatus::ServerStatus(frame.status)),
            None => tracing::warn!(
                identifier = frame.identifier,
                "error frame referenced an identifier this connection never issued"
            ),
        }

        let dropped: Vec<u32> = self
            .in_flight
            .identifiers_from(frame.identifier.wrapping_add(1))
            .filter(|&id| self.in_flight.get(id).unwrap().status() == EnvelopeStatus::NoErrors)
            .collect();

        for identifier in dropped {
            let message = self.in_flight.get(identifier).unwrap().message().clone();
            self.requeue(identifier, message, EnvelopeStatus::EarlierError);
        }

        Ok(())
    }

    fn next_identifier(&mut self) -> u32 {
        self.last_identifier = self.last_identifier.wrapping_add(1);
        self.last_identifier
    }

    fn insert_new_envelope(&mut self, message: Message) -> u32 {
        let identifier = self.next_identifier();
        self.in_flight.insert(MessageEnvelope::new(identifier, message));
        if self.in_flight.len() == self.config.max_in_flight_high_water_mark {
            tracing::warn!(
                fingerprint = self.certificate.fingerprint(),
                watermark = self.config.max_in_flight_high_water_mark,
                "in-flight table has grown past its high-water mark and never shrinks for the \
                 life of this connection"
            );
        }
        identifier
    }

    /// Re-queues `message` under a fresh identifier and links `old_identifier`
    /// to it via `retryEnvelope`.
    fn requeue(&mut self, old_identifier: u32, message: Message, status: EnvelopeStatus) -> u32 {
        let new_identifier = self.insert_new_envelope(message);
        self.in_flight
            .get_mut(old_identifier)
            .expect("old_identifier must already be in_flight")
            .set_retry(new_identifier, status);
        self.send_queue.push_back(new_identifier);
        new_identifier
    }
}
