//! Push notification client with bounded concurrent dispatch.
//!
//! A single long-lived connection to the push service carries many
//! concurrent request/response streams. The peer advertises how many may be
//! open at once and can change that limit at any time. This crate sends a
//! batch of notifications with as much concurrency as the peer currently
//! allows, and maps every notification to exactly one outcome.
//!
//! # Architecture
//!
//! ```text
//!   notifications
//!        |
//!   +----v-------------+   refresh each iteration   +--------------------+
//!   | Client           |--------------------------->| ConcurrencyLimiter |
//!   | send_batch()     |                            +--------------------+
//!   |  FIFO of streams |   connect (bounded retry)  +--------------------+
//!   |                  |--------------------------->| ConnectionManager  |
//!   +----+-------------+                            +--------------------+
//!        | open_stream / await_response
//!   +----v-------------+
//!   | StreamTransport  |  framing, flow control, TLS (e.g. pushline-h2)
//!   +------------------+
//! ```
//!
//! Responses are classified by [`classify`] into an [`Outcome`] or a
//! [`UnitError`] when the peer's reason is not in the taxonomy.
//!
//! # Example
//!
//! ```rust,ignore
//! use pushline::{Client, Notification, Payload, Priority};
//!
//! let mut client = Client::new(transport);
//! let batch = tokens
//!     .iter()
//!     .map(|t| Notification::new(t.as_str(), Payload::new().alert("Hello, world!")));
//!
//! let results = client.send_batch(batch, "com.example.App", Priority::Immediate).await?;
//! for (token, result) in &results {
//!     match result {
//!         Ok(Outcome::Success) => {}
//!         Ok(Outcome::Failure(reason)) => eprintln!("{token}: {reason}"),
//!         Err(e) => eprintln!("{token}: {e}"),
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod limiter;
pub mod metrics;
pub mod notification;
pub mod payload;
pub mod reason;
pub mod request;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, Endpoint, Environment, RetryPolicy};
pub use connection::ConnectionManager;
pub use dispatch::ResultMap;
pub use error::{Error, TransportError, UnitError};
pub use limiter::{CONCURRENT_STREAMS_SAFETY_MAXIMUM, ConcurrencyLimiter};
pub use notification::{Notification, Priority};
pub use payload::{Alert, AlertBody, MAX_PAYLOAD_SIZE, Payload};
pub use reason::{ErrorKind, Outcome, Reason, classify};
pub use request::PushRequest;
pub use transport::{RawResponse, StreamId, StreamTransport};
