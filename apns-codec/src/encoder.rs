// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A growable byte buffer for writing wire frames.
//!
//! Modeled on `s2n-codec`'s `Encoder` trait and `EncoderBuffer`, cut down to
//! the append-only, heap-backed case this crate needs: frames are built up
//! field by field into a `Vec<u8>` and handed off to the socket whole.

use byteorder::{BigEndian, ByteOrder};

#[derive(Clone, Debug, Default)]
pub struct EncoderBuffer {
    bytes: Vec<u8>,
}

impl EncoderBuffer {
    #[inline]
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
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
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    pub fn encode<T: EncoderValue>(&mut self, value: &T) -> &mut Self {
        value.encode(self);
        self
    }

    #[inline]
    pub fn write_slice(&mut self, slice: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(slice);
        self
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, value);
        self.write_slice(&buf)
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, value);
        self.write_slice(&buf)
    }
}

pub trait EncoderValue {
    fn encode(&self, buffer: &mut EncoderBuffer);
}

impl EncoderValue for u8 {
    #[inline]
    fn encode(&self, buffer: &mut EncoderBuffer) {
        buffer.write_u8(*self);
    }
}

impl EncoderValue for u16 {
    #[inline]
    fn encode(&self, buffer: &mut EncoderBuffer) {
        buffer.write_u16(*self);
    }
}

impl EncoderValue for u32 {
    #[inline]
    fn encode(&self, buffer: &mut EncoderBuffer) {
        buffer.write_u32(*self);
    }
}

impl<const N: usize> EncoderValue for [u8; N] {
    #[inline]
    fn encode(&self, buffer: &mut EncoderBuffer) {
        buffer.write_slice(self);
    }
}

impl EncoderValue for &[u8] {
    #[inline]
    fn encode(&self, buffer: &mut EncoderBuffer) {
        buffer.write_slice(self);
    }
}

// NetworkEndian is an alias used by callers porting from byteorder directly;
// BigEndian is what the APNS wire format actually specifies.
pub use byteorder::BigEndian as NetworkEndian;
