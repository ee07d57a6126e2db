//! DNS lookups.
//!
//! This module resolves the TLSA record set of a service with `hickory`:
//! - Query name derivation (`_{port}._tcp.{host}.`)
//! - EDNS0 with the DNSSEC-OK bit when authentication is required
//! - Authenticated-Data flag enforcement
//!
//! Queries go to a single nameserver chosen by `crate::initialization`.

mod tlsa;

// Re-export public API
pub use tlsa::{lookup_tlsa, tlsa_name, TlsaQuery};

#[cfg(test)]
mod tests;
