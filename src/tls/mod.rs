//! TLS connection and peer certificate retrieval.
//!
//! This module connects to the service, runs the STARTTLS negotiation when
//! one is configured, and performs the TLS handshake in one of two modes:
//! - verified: chain and hostname checked against the webpki root store
//! - unverified: any certificate accepted, handshake signatures still checked
//!
//! A verification failure in the first mode surfaces as
//! [`ConnectError::Trust`] so the caller can decide whether to retry.
//!
//! Uses `tokio-rustls` for async TLS connections and `x509-parser` for certificate parsing.

mod extract;
mod verifier;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error_handling::ConnectError;
use crate::starttls::{negotiate, StartTls};

pub use extract::CertificateMaterial;
use verifier::AcceptAnyCertificate;

/// Where and how to connect for the certificate.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    /// Checked hostname, used for SNI and verification
    pub host: String,
    /// Address actually connected to
    pub connect_host: String,
    /// Port actually connected to
    pub connect_port: u16,
    /// STARTTLS protocol to run before the handshake
    pub starttls: Option<StartTls>,
    /// Name announced in the SMTP `EHLO`
    pub client_name: String,
    /// Bound for the connect, each negotiation step and the handshake
    pub timeout: Duration,
}

impl ConnectTarget {
    fn address(&self) -> String {
        format!("{}:{}", self.connect_host, self.connect_port)
    }
}

/// Builds the rustls client configuration for the requested mode.
fn client_config(verify: bool) -> Result<ClientConfig, ConnectError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| ConnectError::TlsConfig(e.to_string()))?;

    let config = if verify {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder
            .with_root_certificates(root_store)
            .with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate::new(provider)))
            .with_no_client_auth()
    };
    Ok(config)
}

/// Separates certificate trust failures from every other handshake failure.
fn classify_handshake_error(address: String, err: io::Error) -> ConnectError {
    let rustls_error = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>());
    match rustls_error {
        Some(e) if matches!(e, rustls::Error::InvalidCertificate(_)) => {
            ConnectError::Trust(e.to_string())
        }
        _ => ConnectError::Handshake {
            address,
            reason: err.to_string(),
        },
    }
}

/// Connects to `target` and returns the certificate the server presents.
///
/// With `verify` set, the chain and hostname must validate against the
/// webpki roots. The connection is shut down as soon as the certificate has
/// been read.
///
/// # Errors
///
/// - [`ConnectError::Trust`] if verification is enabled and the certificate
///   is untrusted or does not cover `target.host`
/// - [`ConnectError::Negotiation`] if STARTTLS fails
/// - [`ConnectError::Connect`], [`ConnectError::Timeout`] or
///   [`ConnectError::Handshake`] for transport failures
pub async fn fetch_certificate(
    target: &ConnectTarget,
    verify: bool,
) -> Result<CertificateMaterial, ConnectError> {
    let address = target.address();
    let server_name = ServerName::try_from(target.host.trim_end_matches('.').to_string())
        .map_err(|e| ConnectError::InvalidServerName(format!("{}: {e}", target.host)))?;
    let connector = TlsConnector::from(Arc::new(client_config(verify)?));

    log::info!("Connecting to {address}");
    let sock = match tokio::time::timeout(
        target.timeout,
        TcpStream::connect((target.connect_host.as_str(), target.connect_port)),
    )
    .await
    {
        Ok(Ok(sock)) => sock,
        Ok(Err(e)) => {
            return Err(ConnectError::Connect {
                address,
                reason: e.to_string(),
            })
        }
        Err(_) => {
            return Err(ConnectError::Timeout {
                operation: "Connection",
                address,
                timeout: target.timeout,
            })
        }
    };

    let mut stream = BufReader::new(sock);
    if let Some(protocol) = target.starttls {
        negotiate(
            protocol,
            &mut stream,
            &target.host,
            &target.client_name,
            target.timeout,
        )
        .await?;
    }

    log::debug!(
        "Starting TLS handshake with {address} (SNI {}, verification {})",
        target.host,
        if verify { "on" } else { "off" }
    );
    let mut tls_stream =
        match tokio::time::timeout(target.timeout, connector.connect(server_name, stream)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(classify_handshake_error(address, e)),
            Err(_) => {
                return Err(ConnectError::Timeout {
                    operation: "TLS handshake",
                    address,
                    timeout: target.timeout,
                })
            }
        };

    let der = tls_stream
        .get_ref()
        .1
        .peer_certificates()
        .and_then(|certs| certs.first())
        .map(|cert| cert.as_ref().to_vec())
        .ok_or(ConnectError::NoCertificate)?;

    if let Ok(Err(e)) = tokio::time::timeout(target.timeout, tls_stream.shutdown()).await {
        log::debug!("TLS shutdown with {address} failed: {e}");
    }

    let material = CertificateMaterial::from_der(der)?;
    log::info!(
        "{address} presented {} (expires {})",
        material.subject,
        material.not_after
    );
    Ok(material)
}
