//! Connection establishment with bounded retries.

use tracing::{info, warn};

use crate::config::RetryPolicy;
use crate::error::Error;
use crate::metrics;
use crate::transport::StreamTransport;

#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    policy: RetryPolicy,
}

impl ConnectionManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Connect `transport` unless it is already connected.
    ///
    /// Makes at most `max_attempts` calls to
    /// [`StreamTransport::connect`], waiting `delay` between failures. The
    /// last transport error is returned inside [`Error::Connection`].
    pub async fn ensure_connected<T: StreamTransport>(&self, transport: &mut T) -> Result<(), Error> {
        if transport.is_connected() {
            return Ok(());
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            metrics::CONNECT_ATTEMPTS.increment();

            match transport.connect().await {
                Ok(()) => {
                    info!(attempt, "connected to push service");
                    return Ok(());
                }
                Err(e) => {
                    metrics::CONNECT_FAILURES.increment();
                    warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "failed connecting to push service"
                    );
                    if attempt >= max_attempts {
                        return Err(Error::Connection {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    if !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }
    }
}
