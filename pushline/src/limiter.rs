//! Effective concurrency window.
//!
//! The peer can change its maximum-concurrent-streams setting at any time,
//! so the window is re-derived on every dispatch iteration. Peer values are
//! clamped to `[1, CONCURRENT_STREAMS_SAFETY_MAXIMUM]`: a huge (or absent)
//! limit is capped, and zero still allows one stream so dispatch always makes
//! progress.

use tracing::{info, warn};

use crate::metrics;
use crate::transport::StreamTransport;

/// Upper bound on the window, whatever the peer advertises.
pub const CONCURRENT_STREAMS_SAFETY_MAXIMUM: usize = 1000;

#[derive(Debug, Default)]
pub struct ConcurrencyLimiter {
    /// Raw value seen on the last refresh.
    advertised: Option<u32>,
    window: Option<usize>,
}

impl ConcurrencyLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read the peer's limit from `transport` and return the window.
    pub fn refresh<T: StreamTransport>(&mut self, transport: &T) -> usize {
        self.observe(transport.peer_max_concurrent_streams())
    }

    /// Feed a raw advertised value and return the window.
    ///
    /// Repeating the previous value is a no-op.
    pub fn observe(&mut self, advertised: Option<u32>) -> usize {
        if let Some(window) = self.window
            && advertised == self.advertised
        {
            return window;
        }

        self.advertised = advertised;
        let window = clamp(advertised);
        self.window = Some(window);
        metrics::STREAMS_WINDOW.set(window as i64);
        window
    }

    /// The last computed window, `None` before the first refresh.
    pub fn effective_window(&self) -> Option<usize> {
        self.window
    }
}

fn clamp(advertised: Option<u32>) -> usize {
    let max = CONCURRENT_STREAMS_SAFETY_MAXIMUM;
    match advertised {
        None => {
            warn!(
                window = max,
                "peer did not limit max_concurrent_streams, using safety maximum"
            );
            max
        }
        Some(value) if value as usize > max => {
            warn!(
                advertised = value,
                window = max,
                "peer max_concurrent_streams too high, using safety maximum"
            );
            max
        }
        Some(0) => {
            warn!(
                advertised = 0,
                window = 1,
                "peer max_concurrent_streams less than 1, using 1"
            );
            1
        }
        Some(value) => {
            info!(window = value, "peer set max_concurrent_streams");
            value as usize
        }
    }
}
