//! HTTP/2 transport for the pushline client.
//!
//! Implements [`pushline::StreamTransport`] on the `h2` crate over
//! `tokio-rustls`, authenticating with a client certificate.
//!
//! # Architecture
//!
//! ```text
//!   pushline::Client
//!        |  open_stream / await_response / peer_max_concurrent_streams
//!   +----v------------+
//!   | H2Transport     |  parked ResponseFutures keyed by StreamId
//!   +----+------------+
//!        |  SendRequest (fire), connection task (background reads)
//!   +----v------------+
//!   | h2 + rustls     |
//!   +-----------------+
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pushline::{ClientConfig, Notification, Payload, Priority};
//! use pushline_h2::Credential;
//!
//! async fn example() -> Result<(), pushline_h2::Error> {
//!     let credential = Credential::from_pem_file("provider.pem")?;
//!     let mut client = pushline_h2::client(ClientConfig::sandbox(), &credential)?;
//!
//!     let batch = vec![Notification::new("00fc13adff78", Payload::new().alert("Hi"))];
//!     let results = client.send_batch(batch, "com.example.App", Priority::Immediate).await?;
//!     Ok(())
//! }
//! ```

pub mod credential;
pub mod error;
pub mod transport;

pub use credential::Credential;
pub use error::{CredentialError, Error};
pub use transport::H2Transport;

use pushline::{Client, ClientConfig};

/// A push client on an HTTP/2 transport.
pub type H2Client = Client<H2Transport>;

/// Build a client for the endpoint selected by `config`, authenticating
/// with `credential`. Does not connect; the first send does.
pub fn client(config: ClientConfig, credential: &Credential) -> Result<H2Client, Error> {
    let tls = credential.client_config()?;
    let endpoint = config.endpoint();
    let transport = H2Transport::new(endpoint.host, endpoint.port, tls);
    Ok(Client::with_config(transport, config)?)
}
