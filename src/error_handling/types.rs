//! Error type definitions.
//!
//! This module defines the error types produced by each stage of a check:
//! configuration, DNS resolution, STARTTLS negotiation and the TLS connection.
//! Every error is turned into exactly one verdict by `crate::check`.

use std::time::Duration;

use log::SetLoggerError;
use thiserror::Error;

use crate::starttls::StartTls;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Invalid user-supplied configuration.
///
/// Raised before any network activity takes place and always reported as
/// an `UNKNOWN` verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No hostname to check was given.
    #[error("No host given")]
    EmptyHost,

    /// The `--min-days-valid` value is not `INTEGER[,INTEGER]`.
    #[error("Invalid minimum validity '{0}', expected WARNING[,CRITICAL] days")]
    InvalidMinValidity(String),

    /// The critical expiry threshold is larger than the warning threshold.
    #[error("Critical threshold ({critical} days) exceeds warning threshold ({warning} days)")]
    CriticalAboveWarning {
        /// Warning threshold in days
        warning: u32,
        /// Critical threshold in days
        critical: u32,
    },

    /// The nameserver is neither `IP` nor `IP:PORT`.
    #[error("Invalid nameserver '{0}', expected IP or IP:PORT")]
    InvalidNameserver(String),

    /// No nameserver was given and none could be read from the system.
    #[error("No nameserver configured")]
    NoNameserver,
}

/// Failure to obtain the TLSA record set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The name does not exist or carries no TLSA records.
    #[error("No TLSA records found for {0}")]
    NoRecord(String),

    /// The DNS query did not complete within the configured timeout.
    #[error("DNS query for {name} timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Queried name
        name: String,
        /// Timeout that expired
        timeout: Duration,
    },

    /// DNSSEC was required but the response lacked the Authenticated-Data flag.
    #[error("DNS response for {0} is not DNSSEC-authenticated (AD flag not set)")]
    Unauthenticated(String),

    /// The query name could not be built from the host.
    #[error("Invalid query name {name}: {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Any other transport or server failure.
    #[error("DNS query for {name} failed: {reason}")]
    Transport {
        /// Queried name
        name: String,
        /// Underlying failure
        reason: String,
    },
}

/// A STARTTLS negotiation failed.
///
/// Covers both protocol violations and a server that does not offer
/// STARTTLS. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{protocol} STARTTLS negotiation failed: {cause}")]
pub struct ProtocolError {
    /// Protocol being negotiated
    pub protocol: StartTls,
    /// Human-readable cause
    pub cause: String,
}

impl ProtocolError {
    /// Creates a new negotiation error for `protocol`.
    pub fn new(protocol: StartTls, cause: impl Into<String>) -> Self {
        Self {
            protocol,
            cause: cause.into(),
        }
    }
}

/// Failure to connect and retrieve the peer certificate.
///
/// Only [`ConnectError::Trust`] is recoverable; everything else ends the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// Certificate chain or hostname verification failed.
    #[error("{0}")]
    Trust(String),

    /// STARTTLS negotiation failed.
    #[error(transparent)]
    Negotiation(#[from] ProtocolError),

    /// TCP connection could not be established.
    #[error("Failed to connect to {address}: {reason}")]
    Connect {
        /// `host:port` connected to
        address: String,
        /// Underlying failure
        reason: String,
    },

    /// A network operation exceeded the configured timeout.
    #[error("{operation} with {address} timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Operation that stalled
        operation: &'static str,
        /// `host:port` connected to
        address: String,
        /// Timeout that expired
        timeout: Duration,
    },

    /// TLS handshake failed for a reason unrelated to certificate trust.
    #[error("TLS handshake with {address} failed: {reason}")]
    Handshake {
        /// `host:port` connected to
        address: String,
        /// Underlying failure
        reason: String,
    },

    /// The hostname cannot be used for SNI.
    #[error("Invalid server name {0}")]
    InvalidServerName(String),

    /// The TLS client could not be configured.
    #[error("TLS client configuration error: {0}")]
    TlsConfig(String),

    /// The server completed the handshake without a certificate.
    #[error("Server presented no certificate")]
    NoCertificate,

    /// The peer certificate could not be parsed.
    #[error("Failed to parse peer certificate: {0}")]
    Certificate(String),
}

impl ConnectError {
    /// Returns `true` for failures attributable to certificate trust.
    pub fn is_trust_failure(&self) -> bool {
        matches!(self, Self::Trust(_))
    }
}
