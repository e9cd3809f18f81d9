// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Ambient configuration for a [`crate::Connection`]. No file or CLI format
//! is parsed here (that remains the embedding application's job); this is
//! just the struct it populates.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// A no-op, cloneable async hook invoked once per flush-loop iteration.
///
/// Production callers that want to observe cancellation (e.g.
/// `tokio::signal::ctrl_c()`) can supply their own via
/// [`ClientConfig::with_yield_point`]; tests leave it at the default no-op.
pub type YieldPoint = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

fn default_yield_point() -> YieldPoint {
    Arc::new(|| Box::pin(async {}))
}

/// Timing knobs and bounds for [`crate::Connection::connect`] and
/// [`crate::Connection::flush`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Bound on the TLS connect (including handshake).
    pub connect_timeout: Duration,
    /// Pause after each write so a racing error frame has a chance to land
    /// before the next write (order of 10 ms).
    pub inter_send_pause: Duration,
    /// How long `flush()` waits on an otherwise-drained socket for a
    /// trailing error frame before declaring the flush complete
    /// (order of 1 s).
    pub post_drain_window: Duration,
    /// Soft cap on `inFlight` size at which a caller-visible warning is
    /// logged; purely observational, never enforced as a hard limit.
    pub max_in_flight_high_water_mark: usize,
    /// Upper bound on flush-loop recovery rounds before giving up with
    /// [`crate::FlushError::TooManyRecoveryRounds`].
    pub max_flush_rounds: u32,
    /// Invoked once per flush-loop iteration; see [`YieldPoint`].
    pub yield_point: YieldPoint,
}

impl ClientConfig {
    pub fn with_yield_point(mut self, yield_point: YieldPoint) -> Self {
        self.yield_point = yield_point;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            inter_send_pause: Duration::from_millis(10),
            post_drain_window: Duration::from_secs(1),
            max_in_flight_high_water_mark: 10_000,
            max_flush_rounds: 64,
            yield_point: default_yield_point(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("connect_timeout", &self.connect_timeout)
            .field("inter_send_pause", &self.inter_send_pause)
            .field("post_drain_window", &self.post_drain_window)
            .field(
                "max_in_flight_high_water_mark",
                &self.max_in_flight_high_water_mark,
            )
            .field("max_flush_rounds", &self.max_flush_rounds)
            .field("yield_point", &"<fn>")
            .finish()
    }
}
