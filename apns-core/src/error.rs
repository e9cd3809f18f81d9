// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Structural failure types. Envelope-level outcomes are
//! never raised as errors — they are recorded on the envelope and polled by
//! the caller. These types are reserved for failures that leave a
//! `Connection` unable to make progress at all.

use thiserror::Error;

/// Failure establishing (or re-establishing) the TLS connection to a gateway.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to resolve or open a socket to the gateway: {0}")]
    Io(#[source] std::io::Error),

    #[error("tls client config rejected the certificate or private key: {0}")]
    Tls(#[source] rustls::Error),

    #[error("certificate or private key material was rejected (code 0): {0}")]
    CertificateRejected(#[source] std::io::Error),

    #[error("connect timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// A violation of the wire protocol severe enough that the connection
/// cannot be trusted to continue.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("error frame carried command byte {found}, expected 8")]
    UnexpectedCommand { found: u8 },

    #[error("malformed error frame: {0}")]
    Malformed(#[source] apns_codec::DecoderError),

    #[error("connection closed mid-frame while reading a {expected}-byte error frame")]
    TruncatedFrame { expected: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of the flush loop itself (as opposed to an individual envelope's
/// outcome, which is never an error).
#[derive(Debug, Error)]
pub enum FlushError {
    #[error("connect failed during flush: {0}")]
    Connect(#[from] ConnectError),

    #[error("protocol violation during flush: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(
        "flush did not converge after {0} recovery rounds; the server may be \
         rejecting every resend"
    )]
    TooManyRecoveryRounds(u32),

    #[error("write to the gateway socket failed: {0}")]
    Io(#[from] std::io::Error),
}
