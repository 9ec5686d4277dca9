//! Push client: connection handling and the single-notification path.

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::connection::ConnectionManager;
use crate::error::{Error, UnitError};
use crate::limiter::ConcurrencyLimiter;
use crate::metrics;
use crate::notification::{Notification, Priority};
use crate::reason::{Outcome, classify};
use crate::request::PushRequest;
use crate::transport::{StreamId, StreamTransport};

/// A push client driving one [`StreamTransport`].
///
/// # Example
///
/// ```rust,ignore
/// let mut client = Client::with_config(transport, ClientConfig::sandbox())?;
///
/// // One notification, awaited immediately.
/// let outcome = client.send(&notification, "com.example.App", Priority::Immediate).await?;
///
/// // Many notifications, pipelined on one connection.
/// let results = client.send_batch(notifications, "com.example.App", Priority::Immediate).await?;
/// ```
pub struct Client<T> {
    pub(crate) transport: T,
    pub(crate) config: ClientConfig,
    pub(crate) connection: ConnectionManager,
    pub(crate) limiter: ConcurrencyLimiter,
}

impl<T: StreamTransport> Client<T> {
    /// Create a client with the default configuration.
    pub fn new(transport: T) -> Self {
        let config = ClientConfig::default();
        Self {
            transport,
            connection: ConnectionManager::new(config.connect.clone()),
            config,
            limiter: ConcurrencyLimiter::new(),
        }
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            transport,
            connection: ConnectionManager::new(config.connect.clone()),
            config,
            limiter: ConcurrencyLimiter::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// The window used by the last batch iteration, `None` if no batch has run.
    pub fn effective_window(&self) -> Option<usize> {
        self.limiter.effective_window()
    }

    /// Connect if not already connected, retrying per the configured policy.
    pub async fn connect(&mut self) -> Result<(), Error> {
        self.connection.ensure_connected(&mut self.transport).await
    }

    // ── Sequential API ─────────────────────────────────────────────────

    /// Send one notification and wait for its outcome.
    ///
    /// Bypasses the concurrency window. A notification rejected before
    /// sending, or a response that cannot be classified, is returned as
    /// [`Error::Unit`].
    pub async fn send(
        &mut self,
        notification: &Notification,
        topic: &str,
        priority: Priority,
    ) -> Result<Outcome, Error> {
        let stream = self.send_async(notification, topic, priority).await?;
        self.result(stream).await
    }

    // ── Fire / result API ──────────────────────────────────────────────

    /// Send one notification and return its stream without waiting.
    ///
    /// Pair with [`result`](Self::result). The caller is responsible for
    /// staying within the peer's concurrency limit.
    pub async fn send_async(
        &mut self,
        notification: &Notification,
        topic: &str,
        priority: Priority,
    ) -> Result<StreamId, Error> {
        self.connect().await?;
        Ok(self.open(notification, topic, priority).await??)
    }

    /// Wait for the outcome of a stream opened with [`send_async`](Self::send_async).
    pub async fn result(&mut self, stream: StreamId) -> Result<Outcome, Error> {
        Ok(self.collect(stream).await??)
    }

    // ── Stream primitives ──────────────────────────────────────────────

    /// Open a stream carrying `notification`.
    ///
    /// The inner error is a notification that cannot be sent; nothing goes
    /// on the wire and the connection is untouched.
    pub(crate) async fn open(
        &mut self,
        notification: &Notification,
        topic: &str,
        priority: Priority,
    ) -> Result<Result<StreamId, UnitError>, Error> {
        let request = match PushRequest::new(notification, topic, priority) {
            Ok(request) => request,
            Err(Error::Unit(e)) => {
                metrics::NOTIFICATIONS_INVALID.increment();
                warn!(token = %notification.token, error = %e, "notification not sent");
                return Ok(Err(e));
            }
            Err(e) => return Err(e),
        };
        let stream = self.transport.open_stream(request).await?;
        metrics::NOTIFICATIONS_SENT.increment();
        metrics::STREAMS_OPEN.increment();
        debug!(token = %notification.token, %stream, "sent notification");
        Ok(Ok(stream))
    }

    /// Await and classify one stream.
    ///
    /// The outer error is a transport failure; the inner one is a
    /// per-notification fault that leaves the connection usable.
    pub(crate) async fn collect(
        &mut self,
        stream: StreamId,
    ) -> Result<Result<Outcome, UnitError>, Error> {
        let response = match self.config.response_timeout {
            Some(limit) => {
                let waited =
                    tokio::time::timeout(limit, self.transport.await_response(stream)).await;
                match waited {
                    Ok(response) => response,
                    Err(_) => {
                        self.transport.abandon(stream);
                        metrics::STREAMS_OPEN.decrement();
                        metrics::NOTIFICATIONS_UNCLASSIFIED.increment();
                        return Ok(Err(UnitError::Timeout(limit)));
                    }
                }
            }
            None => self.transport.await_response(stream).await,
        };
        metrics::STREAMS_OPEN.decrement();
        let response = response?;

        let result = classify(response.status, &response.body);
        match &result {
            Ok(Outcome::Success) => metrics::NOTIFICATIONS_SUCCEEDED.increment(),
            Ok(Outcome::Failure(_)) => metrics::NOTIFICATIONS_FAILED.increment(),
            Err(_) => metrics::NOTIFICATIONS_UNCLASSIFIED.increment(),
        };
        Ok(result)
    }
}
