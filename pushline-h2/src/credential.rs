//! Client certificate handling.
//!
//! The push service authenticates providers by TLS client certificate. The
//! certificate chain and its private key are read from PEM, typically one
//! file holding both.

use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::pem::{self, PemObject};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::error::CredentialError;

/// ALPN identifier for HTTP/2.
const ALPN_H2: &[u8] = b"h2";

/// A client certificate chain and its private key.
#[derive(Debug)]
pub struct Credential {
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl Credential {
    /// Load a credential from a PEM file containing the chain and the key.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let pem = std::fs::read(path)?;
        Self::from_pem(&pem)
    }

    /// Parse a credential from PEM bytes containing the chain and the key.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CredentialError> {
        let chain = CertificateDer::pem_slice_iter(pem).collect::<Result<Vec<_>, _>>()?;
        if chain.is_empty() {
            return Err(CredentialError::NoCertificate);
        }
        let key = PrivateKeyDer::from_pem_slice(pem).map_err(|e| match e {
            pem::Error::NoItemsFound => CredentialError::NoPrivateKey,
            e => CredentialError::Pem(e),
        })?;
        Ok(Self { chain, key })
    }

    /// Create a credential from already-decoded DER parts.
    pub fn from_der(chain: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> Self {
        Self { chain, key }
    }

    /// Number of certificates in the chain.
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Build a TLS client configuration presenting this credential.
    ///
    /// Server certificates are verified against the webpki root set; ALPN
    /// is restricted to `h2`.
    pub fn client_config(&self) -> Result<Arc<rustls::ClientConfig>, CredentialError> {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_client_auth_cert(self.chain.clone(), self.key.clone_key())?;
        config.alpn_protocols = vec![ALPN_H2.to_vec()];
        Ok(Arc::new(config))
    }
}
