//! Error handling.
//!
//! This module provides the error types for every stage of a check. Errors
//! are categorized into:
//! - **Configuration**: bad user input, detected before any network activity
//! - **Resolution**: TLSA lookup failures, including missing DNSSEC authentication
//! - **Negotiation**: STARTTLS protocol failures
//! - **Connection**: transport and TLS failures, with trust failures kept apart

mod types;

// Re-export public API
pub use types::{ConfigError, ConnectError, InitializationError, ProtocolError, ResolveError};
