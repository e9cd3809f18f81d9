// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Bounds-checked buffer primitives for reading and writing the APNS legacy
//! binary wire format: big-endian scalar fields and fixed-size byte arrays,
//! consumed and produced without manual offset arithmetic.

mod decoder;
mod encoder;
mod error;

pub use decoder::{DecoderBuffer, DecoderResult, DecoderValue};
pub use encoder::{EncoderBuffer, EncoderValue, NetworkEndian};
pub use error::DecoderError;
