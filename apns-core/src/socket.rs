// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The socket abstraction a [`crate::Connection`] writes frames to and reads
//! error frames from. Boxed as a trait object so the production TLS stream
//! and a test double (an in-memory duplex pair) are interchangeable without
//! making `Connection` generic.

use tokio::io::{AsyncRead, AsyncWrite};

/// Anything a `Connection` can write frames to and read error frames from.
pub trait Socket: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Socket for T {}

pub type BoxedSocket = Box<dyn Socket>;
