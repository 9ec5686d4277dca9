//! HTTP/2 stream transport on the `h2` crate.
//!
//! Requests are fired without waiting, and each stream's response future is
//! parked under a `StreamId` until the caller asks for it. The `h2`
//! connection task keeps reading in the background, so responses that
//! complete out of order are buffered until collected.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use h2::client::{ResponseFuture, SendRequest};
use http::{Method, Request};
use pushline::{PushRequest, RawResponse, StreamId, StreamTransport, TransportError};
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::error::from_h2;

/// How the TCP connection is wrapped before the HTTP/2 handshake.
#[derive(Clone)]
enum Security {
    /// TLS with ALPN `h2`.
    Tls(TlsConnector),
    /// HTTP/2 with prior knowledge over plain TCP. For local testing and
    /// TLS-terminating proxies.
    Plain,
}

/// A [`StreamTransport`] over one HTTP/2 connection.
pub struct H2Transport {
    host: String,
    port: u16,
    security: Security,
    sender: Option<SendRequest<Bytes>>,
    driver: Option<JoinHandle<()>>,
    streams: HashMap<StreamId, ResponseFuture>,
    next_id: u64,
}

impl H2Transport {
    /// Transport for `host:port` over TLS using `tls` (which must offer ALPN `h2`).
    pub fn new(host: impl Into<String>, port: u16, tls: Arc<rustls::ClientConfig>) -> Self {
        Self::with_security(host.into(), port, Security::Tls(TlsConnector::from(tls)))
    }

    /// Transport for `host:port` speaking HTTP/2 over plain TCP.
    pub fn plain(host: impl Into<String>, port: u16) -> Self {
        Self::with_security(host.into(), port, Security::Plain)
    }

    fn with_security(host: String, port: u16, security: Security) -> Self {
        Self {
            host,
            port,
            security,
            sender: None,
            driver: None,
            streams: HashMap::new(),
            next_id: 0,
        }
    }

    /// Number of streams opened and not yet awaited or abandoned.
    pub fn pending_count(&self) -> usize {
        self.streams.len()
    }

    fn scheme(&self) -> &'static str {
        match self.security {
            Security::Tls(_) => "https",
            Security::Plain => "http",
        }
    }

    /// Run the HTTP/2 handshake on `io`, spawn the connection driver, and
    /// wait for a PING round trip.
    ///
    /// The peer sends its SETTINGS before answering the PING, so once the
    /// PONG arrives the advertised stream limit has been applied.
    async fn handshake<S>(&mut self, io: S) -> Result<(), TransportError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sender, mut connection) = h2::client::Builder::new()
            .enable_push(false)
            .handshake::<_, Bytes>(io)
            .await
            .map_err(from_h2)?;
        let ping_pong = connection.ping_pong();

        let host = self.host.clone();
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(%host, error = %e, "http/2 connection closed with error");
            } else {
                debug!(%host, "http/2 connection closed");
            }
        });

        if let Some(mut ping_pong) = ping_pong {
            ping_pong.ping(h2::Ping::opaque()).await.map_err(from_h2)?;
        }

        self.sender = Some(sender.ready().await.map_err(from_h2)?);
        self.driver = Some(driver);
        Ok(())
    }

    fn build_request(&self, request: &PushRequest) -> Result<Request<()>, TransportError> {
        let method = Method::from_bytes(PushRequest::METHOD.as_bytes())
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        let uri = format!("{}://{}:{}{}", self.scheme(), self.host, self.port, request.path);
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        builder
            .body(())
            .map_err(|e| TransportError::Protocol(e.to_string()))
    }

    fn disconnect(&mut self) {
        self.sender = None;
        self.streams.clear();
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

impl StreamTransport for H2Transport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.disconnect();

        let tcp = TcpStream::connect((self.host.as_str(), self.port)).await?;
        tcp.set_nodelay(true)?;

        match self.security.clone() {
            Security::Plain => self.handshake(tcp).await,
            Security::Tls(connector) => {
                let server_name = ServerName::try_from(self.host.clone())
                    .map_err(|e| TransportError::Tls(e.to_string()))?;
                let tls = connector
                    .connect(server_name, tcp)
                    .await
                    .map_err(|e| TransportError::Tls(e.to_string()))?;
                self.handshake(tls).await
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.sender.is_some() && self.driver.as_ref().is_some_and(|d| !d.is_finished())
    }

    async fn open_stream(&mut self, request: PushRequest) -> Result<StreamId, TransportError> {
        let http_request = self.build_request(&request)?;

        // Work on a clone; the stored sender stays usable if this send fails.
        let sender = self.sender.clone().ok_or(TransportError::NotConnected)?;
        let mut sender = sender.ready().await.map_err(from_h2)?;

        let end_stream = request.body.is_empty();
        let (response, mut body) = sender
            .send_request(http_request, end_stream)
            .map_err(from_h2)?;
        if !end_stream {
            body.send_data(request.body, true).map_err(from_h2)?;
        }

        self.next_id += 1;
        let id = StreamId::new(self.next_id);
        self.streams.insert(id, response);
        Ok(id)
    }

    async fn await_response(&mut self, stream: StreamId) -> Result<RawResponse, TransportError> {
        let response = self
            .streams
            .remove(&stream)
            .ok_or(TransportError::UnknownStream(stream))?;
        let response = response.await.map_err(from_h2)?;
        let status = response.status().as_u16();

        let mut recv = response.into_body();
        let mut body = BytesMut::new();
        while let Some(chunk) = recv.data().await {
            let chunk = chunk.map_err(from_h2)?;
            recv.flow_control()
                .release_capacity(chunk.len())
                .map_err(from_h2)?;
            body.extend_from_slice(&chunk);
        }

        Ok(RawResponse::new(status, body.freeze()))
    }

    fn abandon(&mut self, stream: StreamId) {
        // Dropping the response future resets the stream.
        self.streams.remove(&stream);
    }

    fn peer_max_concurrent_streams(&self) -> Option<u32> {
        let sender = self.sender.as_ref()?;
        u32::try_from(sender.current_max_send_streams()).ok()
    }
}

impl Drop for H2Transport {
    fn drop(&mut self) {
        self.disconnect();
    }
}
