// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

/// Failure decoding a value out of a [`crate::DecoderBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderError {
    /// The buffer did not contain the requested number of bytes.
    UnexpectedEof(usize),
    /// The buffer still had bytes left after a value claimed to consume it all.
    UnexpectedBytes(usize),
    /// A length prefix did not fit in the target integer type.
    LengthCapacityExceeded,
}

impl fmt::Display for DecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof(len) => write!(f, "unexpected eof, needed {len} bytes"),
            Self::UnexpectedBytes(len) => write!(f, "unexpected {len} trailing bytes"),
            Self::LengthCapacityExceeded => {
                write!(f, "length prefix did not fit in target integer type")
            }
        }
    }
}

impl std::error::Error for DecoderError {}
