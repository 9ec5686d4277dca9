use std::io;

/// Errors produced while loading a client certificate.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The PEM source could not be read.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The PEM data was malformed.
    #[error("pem error: {0}")]
    Pem(#[from] rustls::pki_types::pem::Error),

    /// The PEM data contained no certificate.
    #[error("no certificate found in PEM data")]
    NoCertificate,

    /// The PEM data contained no private key.
    #[error("no private key found in PEM data")]
    NoPrivateKey,

    /// rustls rejected the certificate or key.
    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),
}

/// Errors produced while building an HTTP/2 client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Client(#[from] pushline::Error),
}

/// Map an `h2` error onto the transport error surface.
pub(crate) fn from_h2(e: h2::Error) -> pushline::TransportError {
    if e.is_io() {
        match e.into_io() {
            Some(io) => pushline::TransportError::Io(io),
            None => pushline::TransportError::ConnectionClosed,
        }
    } else {
        pushline::TransportError::Protocol(e.to_string())
    }
}
