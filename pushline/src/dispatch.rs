//! Batch dispatch over a sliding window of streams.
//!
//! Requests go out in input order while the window has room; once it is full
//! (or the input is exhausted) the oldest open stream is awaited. Responses
//! are therefore consumed in send order, not completion order: a slow stream
//! at the head holds back reaping of faster ones behind it, but the number
//! of open streams never exceeds the window.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::{Error, UnitError};
use crate::metrics;
use crate::notification::{Notification, Priority};
use crate::reason::Outcome;
use crate::transport::{StreamId, StreamTransport};

/// Per-token results of a batch.
pub type ResultMap = HashMap<String, Result<Outcome, UnitError>>;

/// A sent notification awaiting its response.
struct OpenStream {
    stream: StreamId,
    token: String,
}

impl<T: StreamTransport> Client<T> {
    /// Send `notifications` concurrently on one connection and collect every
    /// outcome.
    ///
    /// The window is re-read from the transport on every iteration, so a
    /// limit change announced mid-batch takes effect on the next send
    /// decision. An empty input returns an empty map without connecting.
    ///
    /// Each notification ends up with exactly one entry keyed by its token;
    /// when a token repeats, the later result replaces the earlier one.
    /// Rejections, unclassifiable responses and notifications that cannot
    /// be sent (bad token, oversized payload) are recorded per token and
    /// never stop the batch. Connection and transport failures abort it,
    /// after abandoning every stream still open.
    pub async fn send_batch<I>(
        &mut self,
        notifications: I,
        topic: &str,
        priority: Priority,
    ) -> Result<ResultMap, Error>
    where
        I: IntoIterator<Item = Notification>,
    {
        let mut pending = notifications.into_iter();
        let mut next = pending.next();
        if next.is_none() {
            return Ok(ResultMap::new());
        }

        // Connect first so the peer's initial limit is known before the
        // first send decision.
        self.connect().await?;

        let mut results = ResultMap::new();
        let mut open: VecDeque<OpenStream> = VecDeque::new();

        while next.is_some() || !open.is_empty() {
            let window = self.limiter.refresh(&self.transport);

            if open.len() < window
                && let Some(notification) = next.take()
            {
                match self.open(&notification, topic, priority).await {
                    Ok(Ok(stream)) => open.push_back(OpenStream {
                        stream,
                        token: notification.token,
                    }),
                    Ok(Err(e)) => {
                        results.insert(notification.token, Err(e));
                    }
                    Err(e) => {
                        self.abandon_all(open);
                        return Err(e);
                    }
                }

                next = pending.next();
                if next.is_none() {
                    info!(
                        open = open.len(),
                        "finished sending batch, waiting for pending responses"
                    );
                }
            } else if let Some(oldest) = open.pop_front() {
                let result = match self.collect(oldest.stream).await {
                    Ok(result) => result,
                    Err(e) => {
                        self.abandon_all(open);
                        return Err(e);
                    }
                };
                debug!(token = %oldest.token, stream = %oldest.stream, ?result, "got response");
                results.insert(oldest.token, result);
            }
        }

        Ok(results)
    }

    /// Release the streams of an aborted batch.
    fn abandon_all(&mut self, open: VecDeque<OpenStream>) {
        if !open.is_empty() {
            warn!(open = open.len(), "batch aborted, abandoning open streams");
        }
        for rec in open {
            self.transport.abandon(rec.stream);
            metrics::STREAMS_OPEN.decrement();
        }
    }
}
