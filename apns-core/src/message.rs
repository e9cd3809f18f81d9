// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The `Message` collaborator: an immutable notification bound
//! for one device token. Payload *construction* (JSON `aps` dictionary
//! assembly) is out of scope — callers serialize their own payload bytes
//! (e.g. with `serde_json`) and hand them to [`MessageBuilder`].

use std::sync::Arc;

use apns_codec::EncoderBuffer;

use crate::certificate::Certificate;

/// Maximum payload size the legacy enhanced frame can carry.
pub const MAX_PAYLOAD_LEN: usize = 256;

const FRAME_COMMAND_NOTIFICATION: u8 = 1;
const DEVICE_TOKEN_LEN: usize = 32;

/// An immutable push notification: destination token, payload bytes, an
/// optional expiration, and an optional per-message certificate override.
#[derive(Clone)]
pub struct Message {
    token: [u8; DEVICE_TOKEN_LEN],
    payload: Arc<[u8]>,
    expiration: Option<u32>,
    certificate: Option<Certificate>,
}

impl Message {
    pub fn builder(token: [u8; DEVICE_TOKEN_LEN], payload: impl Into<Arc<[u8]>>) -> MessageBuilder {
        MessageBuilder {
            token,
            payload: payload.into(),
            expiration: None,
            certificate: None,
        }
    }

    pub fn token(&self) -> &[u8; DEVICE_TOKEN_LEN] {
        &self.token
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn expiration(&self) -> Option<u32> {
        self.expiration
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// `true` iff the payload fits in the legacy enhanced frame.
    pub fn validate_length(&self) -> bool {
        self.payload.len() <= MAX_PAYLOAD_LEN
    }

    /// Encodes the legacy enhanced-notification frame (command byte 1) for
    /// the given identifier. Does not check [`Self::validate_length`];
    /// callers must check that before encoding (`Connection::queue` does).
    pub fn binary_encode(&self, identifier: u32) -> Vec<u8> {
        let mut buffer = EncoderBuffer::with_capacity(
            1 + 4 + 4 + 2 + DEVICE_TOKEN_LEN + 2 + self.payload.len(),
        );
        buffer
            .encode(&FRAME_COMMAND_NOTIFICATION)
            .encode(&identifier)
            .encode(&self.expiration.unwrap_or(0))
            .encode(&(DEVICE_TOKEN_LEN as u16))
            .encode(&self.token)
            .encode(&(self.payload.len() as u16))
            .write_slice(&self.payload);
        buffer.into_vec()
    }
}

/// Builds a [`Message`] from the fields the wire format itself requires:
/// token, payload bytes, optional expiration, optional certificate
/// override. Does not build payload *content*.
pub struct MessageBuilder {
    token: [u8; DEVICE_TOKEN_LEN],
    payload: Arc<[u8]>,
    expiration: Option<u32>,
    certificate: Option<Certificate>,
}

impl MessageBuilder {
    pub fn expiration(mut self, expiration: u32) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn certificate(mut self, certificate: Certificate) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn build(self) -> Message {
        Message {
            token: self.token,
            payload: self.payload,
            expiration: self.expiration,
            certificate: self.certificate,
        }
    }
}

/// Decodes a 64-character hex device token string into its raw 32-byte
/// form, as the wire format and `Message::builder` both require.
pub fn decode_token_hex(hex: &str) -> Result<[u8; DEVICE_TOKEN_LEN], TokenHexError> {
    if hex.len() != DEVICE_TOKEN_LEN * 2 {
        return Err(TokenHexError::WrongLength(hex.len()));
    }
    let mut token = [0u8; DEVICE_TOKEN_LEN];
    for (i, chunk) in token.iter_mut().enumerate() {
        let byte_str = &hex[i * 2..i * 2 + 2];
        *chunk = u8::from_str_radix(byte_str, 16).map_err(|_| TokenHexError::NotHex)?;
    }
    Ok(token)
}

#[derive(Debug, thiserror::Error)]
pub enum TokenHexError {
    #[error("device token hex string had {0} characters, expected 64")]
    WrongLength(usize),
    #[error("device token was not valid hex")]
    NotHex,
}
