//! The stream transport seam.
//!
//! A transport owns one physical connection and multiplexes independent
//! request/response exchanges over it. The client never touches framing,
//! flow control, or TLS; it only opens streams, awaits their responses, and
//! reads the peer's advertised concurrency limit.

use std::fmt;
use std::future::Future;

use bytes::Bytes;

use crate::error::TransportError;
use crate::request::PushRequest;

/// Opaque handle for an open stream, issued by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

impl StreamId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status and body of a completed stream.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A multiplexed connection to the push service.
///
/// Calls are issued sequentially by a single owner (`&mut self`); any
/// pipelining happens inside the transport. Implementations must keep the
/// response of every opened stream until it is awaited or abandoned,
/// regardless of completion order.
pub trait StreamTransport {
    /// Establish the underlying connection.
    ///
    /// On success the peer's initial settings must already be visible
    /// through [`peer_max_concurrent_streams`](Self::peer_max_concurrent_streams).
    fn connect(&mut self) -> impl Future<Output = Result<(), TransportError>>;

    /// Whether the connection is currently usable.
    fn is_connected(&self) -> bool;

    /// Send a request on a new stream. Returns once the request is queued;
    /// does not wait for the response.
    fn open_stream(
        &mut self,
        request: PushRequest,
    ) -> impl Future<Output = Result<StreamId, TransportError>>;

    /// Wait for the response of a previously opened stream.
    fn await_response(
        &mut self,
        stream: StreamId,
    ) -> impl Future<Output = Result<RawResponse, TransportError>>;

    /// Release a stream whose response will never be awaited.
    fn abandon(&mut self, _stream: StreamId) {}

    /// The latest maximum-concurrent-streams value the peer advertised.
    ///
    /// `None` means the peer has not set a limit.
    fn peer_max_concurrent_streams(&self) -> Option<u32>;
}
