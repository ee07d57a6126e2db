//! dane_check library: DANE TLSA validation of TLS services
//!
//! This library checks that the certificate a TLS service presents is
//! authorized by the DNSSEC-signed TLSA records published for it (RFC 6698),
//! optionally cross-checked against PKIX certificate-authority trust, and
//! reduces the outcome to a single monitoring-plugin verdict.
//!
//! # Example
//!
//! ```no_run
//! use dane_check::{run, Config, StartTls};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = Config {
//!     host: "mx.example.org".to_string(),
//!     port: 25,
//!     starttls: Some(StartTls::Smtp),
//!     ..Default::default()
//! };
//!
//! let verdict = run(&config).await;
//! println!("{verdict}");
//! std::process::exit(verdict.exit_code());
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. A check is strictly sequential, so
//! the current-thread runtime is sufficient.

#![warn(missing_docs)]

pub mod check;
pub mod config;
pub mod dane;
pub mod dns;
mod error_handling;
pub mod initialization;
pub mod starttls;
pub mod tls;

// Re-export public API
pub use check::{run, run_check, CertificateSource, CheckPolicy, Status, TlsaSource, Verdict};
pub use config::{Config, LogFormat, LogLevel, MinValidity};
pub use dane::{matches, CertificateUsage, MatchingType, Selector, TlsaRecord};
pub use error_handling::{
    ConfigError, ConnectError, InitializationError, ProtocolError, ResolveError,
};
pub use starttls::StartTls;
pub use tls::CertificateMaterial;
