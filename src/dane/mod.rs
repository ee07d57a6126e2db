//! DANE TLSA records and certificate matching.
//!
//! This module provides:
//! - The TLSA record model (usage, selector, matching type, association data)
//! - The matcher that evaluates one record against a presented certificate

mod matching;
mod records;

// Re-export public API
pub use matching::{matches, matching_records};
pub use records::{CertificateUsage, MatchingType, Selector, TlsaRecord};
