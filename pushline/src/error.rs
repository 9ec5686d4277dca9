//! Error types for the push client.

use std::io;
use std::time::Duration;

use crate::transport::StreamId;

/// Errors that abort a client operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport could not be connected within the retry budget.
    ///
    /// Raised before any stream is opened, so no partial results exist.
    #[error("failed to connect after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The transport failed while opening or awaiting a stream.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A notification payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),

    /// A single-notification send could not be classified.
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Per-notification faults that are not members of the reason taxonomy.
///
/// In a batch these are recorded against the notification's token and the
/// batch carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    /// The peer returned a reason code missing from the taxonomy table.
    /// Points at a protocol version mismatch rather than a bad notification.
    #[error("unrecognized reason code {0:?}")]
    UnknownReason(String),

    /// A non-200 response whose body did not carry a reason.
    #[error("malformed error response (status {status}): {detail}")]
    MalformedResponse { status: u16, detail: String },

    /// No response arrived within the configured response timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The device token cannot be placed in a request path. Never sent.
    #[error("invalid device token {0:?}")]
    InvalidToken(String),

    /// The serialized payload exceeds the service limit. Never sent.
    #[error("payload is {size} bytes, limit is {max}")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Errors reported by a [`StreamTransport`](crate::StreamTransport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A stream was opened before the connection was established.
    #[error("not connected")]
    NotConnected,

    /// The connection was closed before a response was received.
    #[error("connection closed")]
    ConnectionClosed,

    /// The stream handle was never issued or was already consumed.
    #[error("unknown stream {0}")]
    UnknownStream(StreamId),

    /// I/O error during connect, send, or recv.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// TLS setup or handshake failure.
    #[error("tls error: {0}")]
    Tls(String),

    /// Framing or protocol violation reported by the transport.
    #[error("protocol error: {0}")]
    Protocol(String),
}
