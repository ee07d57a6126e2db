//! STARTTLS negotiation.
//!
//! Each supported protocol upgrades a connected plaintext stream so that a
//! TLS handshake can start immediately afterwards:
//! - SMTP (`EHLO` / `STARTTLS`)
//! - FTP (`AUTH TLS`)
//! - IMAP (tagged `CAPABILITY` / `STARTTLS`)
//! - XMPP (`<starttls/>` within the stream header)
//! - Quassel (binary handshake announcing the encryption feature bit)
//!
//! The negotiators share no state. A failed negotiation is final and is
//! never retried.

mod ftp;
mod imap;
mod quassel;
mod session;
mod smtp;
mod xmpp;

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::error_handling::ProtocolError;
use session::Session;

/// Protocol spoken in plaintext before the TLS handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum StartTls {
    /// SMTP, RFC 3207
    Smtp,
    /// FTP, RFC 4217
    Ftp,
    /// IMAP, RFC 3501
    Imap,
    /// XMPP, RFC 6120
    Xmpp,
    /// Quassel core protocol
    Quassel,
}

impl fmt::Display for StartTls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Smtp => "SMTP",
            Self::Ftp => "FTP",
            Self::Imap => "IMAP",
            Self::Xmpp => "XMPP",
            Self::Quassel => "Quassel",
        };
        f.write_str(name)
    }
}

/// Runs the STARTTLS exchange for `protocol` over `stream`.
///
/// `domain` is the checked hostname (used as the XMPP stream destination),
/// `client_name` is announced in the SMTP `EHLO`. Every read and write is
/// bounded by `timeout`.
///
/// # Errors
///
/// Returns a [`ProtocolError`] when the server violates the protocol, does
/// not offer STARTTLS, closes the connection or stalls past `timeout`.
pub async fn negotiate<S>(
    protocol: StartTls,
    stream: &mut S,
    domain: &str,
    client_name: &str,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    log::debug!("Negotiating {protocol} STARTTLS with {domain}");
    let mut session = Session::new(stream, protocol, timeout);
    match protocol {
        StartTls::Smtp => smtp::negotiate(&mut session, client_name).await,
        StartTls::Ftp => ftp::negotiate(&mut session).await,
        StartTls::Imap => imap::negotiate(&mut session).await,
        StartTls::Xmpp => xmpp::negotiate(&mut session, domain).await,
        StartTls::Quassel => quassel::negotiate(&mut session).await,
    }?;
    log::debug!("{protocol} STARTTLS negotiation complete");
    Ok(())
}
