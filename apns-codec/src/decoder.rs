// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A consuming, bounds-checked byte buffer for reading wire frames.
//!
//! Modeled on `s2n-codec`'s `DecoderBuffer`: each `decode` call returns the
//! decoded value along with a new buffer view over whatever bytes remain,
//! so a frame is read field-by-field without ever indexing out of bounds.

use crate::error::DecoderError;
use byteorder::{BigEndian, ByteOrder};

pub type DecoderResult<'a, T> = Result<(T, DecoderBuffer<'a>), DecoderError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderBuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> DecoderBuffer<'a> {
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }

    /// Splits off `count` bytes, returning them and the remaining buffer.
    #[inline]
    pub fn decode_slice(self, count: usize) -> DecoderResult<'a, &'a [u8]> {
        if self.bytes.len() < count {
            return Err(DecoderError::UnexpectedEof(count));
        }
        let (slice, remaining) = self.bytes.split_at(count);
        Ok((slice, DecoderBuffer::new(remaining)))
    }

    /// Decodes a value implementing [`DecoderValue`], splitting the data
    /// from the current buffer.
    #[inline]
    pub fn decode<T: DecoderValue<'a>>(self) -> DecoderResult<'a, T> {
        T::decode(self)
    }

    /// Returns an error if the buffer is not empty.
    #[inline]
    pub fn ensure_empty(&self) -> Result<(), DecoderError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DecoderError::UnexpectedBytes(self.len()))
        }
    }
}

impl<'a> From<&'a [u8]> for DecoderBuffer<'a> {
    #[inline]
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

pub trait DecoderValue<'a>: Sized {
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderResult<'a, Self>;
}

macro_rules! decode_big_endian {
    ($ty:ty, $read:ident) => {
        impl<'a> DecoderValue<'a> for $ty {
            #[inline]
            fn decode(buffer: DecoderBuffer<'a>) -> DecoderResult<'a, Self> {
                let (slice, buffer) = buffer.decode_slice(core::mem::size_of::<$ty>())?;
                Ok((BigEndian::$read(slice), buffer))
            }
        }
    };
}

impl<'a> DecoderValue<'a> for u8 {
    #[inline]
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderResult<'a, Self> {
        let (slice, buffer) = buffer.decode_slice(1)?;
        Ok((slice[0], buffer))
    }
}

decode_big_endian!(u16, read_u16);
decode_big_endian!(u32, read_u32);

impl<'a, const N: usize> DecoderValue<'a> for [u8; N] {
    #[inline]
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderResult<'a, Self> {
        let (slice, buffer) = buffer.decode_slice(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(slice);
        Ok((array, buffer))
    }
}
