// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Wire-level framing that isn't owned by `Message` itself: decoding the
//! 6-byte error response frame.

use apns_codec::DecoderBuffer;

use crate::error::ProtocolError;

/// The one error-response command byte APNS ever sends.
pub const ERROR_FRAME_COMMAND: u8 = 8;

/// The fixed length of an error response frame: command + status + identifier.
pub const ERROR_FRAME_LEN: usize = 6;

/// A parsed error response frame: command byte (always checked
/// equal to 8 before this is constructed), status code, and the identifier
/// of the envelope APNS is rejecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFrame {
    pub status: u8,
    pub identifier: u32,
}

impl ErrorFrame {
    /// Parses exactly `ERROR_FRAME_LEN` bytes. Any command byte other than
    /// 8 is a fatal `ProtocolError::UnexpectedCommand`.
    pub fn decode(bytes: &[u8; ERROR_FRAME_LEN]) -> Result<Self, ProtocolError> {
        let buffer = DecoderBuffer::new(bytes);
        let (command, buffer) = buffer
            .decode::<u8>()
            .map_err(ProtocolError::Malformed)?;
        if command != ERROR_FRAME_COMMAND {
            return Err(ProtocolError::UnexpectedCommand { found: command });
        }
        let (status, buffer) = buffer
            .decode::<u8>()
            .map_err(ProtocolError::Malformed)?;
        let (identifier, buffer) = buffer
            .decode::<u32>()
            .map_err(ProtocolError::Malformed)?;
        buffer.ensure_empty().map_err(ProtocolError::Malformed)?;

        Ok(Self { status, identifier })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_well_formed_error_frame() {
        let mut bytes = [0u8; ERROR_FRAME_LEN];
        bytes[0] = 8;
        bytes[1] = 3;
        bytes[2..6].copy_from_slice(&42u32.to_be_bytes());

        let frame = ErrorFrame::decode(&bytes).unwrap();
        assert_eq!(frame.status, 3);
        assert_eq!(frame.identifier, 42);
    }

    #[test]
    fn rejects_wrong_command_byte() {
        let mut bytes = [0u8; ERROR_FRAME_LEN];
        bytes[0] = 7;

        let err = ErrorFrame::decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedCommand { found: 7 }
        ));
    }
}
