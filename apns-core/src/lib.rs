// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Connection, envelope, and recovery state machine for the APNS legacy
//! binary protocol: a stateful, multiplexed-by-identifier sender that
//! pipelines writes on a TLS socket, interleaves opportunistic
//! error-frame polling, and performs selective resend of the tail APNS
//! silently drops after reporting the first failing message.
//!
//! Certificate parsing (beyond already-decoded PEM), payload *construction*,
//! and connection pooling across certificates live one layer up, in the
//! `apns` crate; this crate is the single-connection engine.

mod certificate;
mod config;
mod connection;
mod dialer;
mod envelope;
mod error;
mod frame;
mod inflight;
mod message;
mod socket;

pub use certificate::{Certificate, CertificateError, Environment};
pub use config::{ClientConfig, YieldPoint};
pub use connection::Connection;
pub use dialer::{Dialer, TlsDialer};
pub use envelope::{EnvelopeStatus, MessageEnvelope};
pub use error::{ConnectError, FlushError, ProtocolError};
pub use frame::{ErrorFrame, ERROR_FRAME_COMMAND, ERROR_FRAME_LEN};
pub use message::{decode_token_hex, Message, MessageBuilder, TokenHexError, MAX_PAYLOAD_LEN};
pub use socket::{BoxedSocket, Socket};
