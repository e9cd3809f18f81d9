// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A client for Apple's legacy binary Push Notification Service (APNS)
//! gateway: takes messages destined for device tokens, delivers them over a
//! long-lived TLS connection, and recovers from APNS's unusual failure
//! protocol, in which the server reports only the first failing message in
//! a batch and silently drops everything sent after it.
//!
//! The single-connection engine — framing, the flush/recovery state
//! machine, envelope bookkeeping — lives in `apns-core`; this crate adds the
//! production TLS [`GatewayFactory`] and the [`Sender`]/[`GatewayPool`] that
//! fans messages out across certificates.
//!
//! HTTP/2 APNS (the modern provider API), PKCS#12 parsing, payload
//! *construction*, and feedback-service polling are out of scope; see the
//! crate's design notes for why.

mod factory;
mod pool;

pub use apns_core::{
    decode_token_hex, BoxedSocket, Certificate, CertificateError, ClientConfig, ConnectError,
    Connection, Dialer, Environment, EnvelopeStatus, ErrorFrame, FlushError, Message,
    MessageBuilder, MessageEnvelope, ProtocolError, Socket, TlsDialer, TokenHexError, YieldPoint,
    ERROR_FRAME_COMMAND, ERROR_FRAME_LEN, MAX_PAYLOAD_LEN,
};
pub use factory::{GatewayFactory, TlsGatewayFactory};
pub use pool::{GatewayPool, Sender, SenderError};
