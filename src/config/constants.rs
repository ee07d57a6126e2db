//! Configuration constants.
//!
//! This module defines the defaults and protocol limits used throughout the
//! check.

/// Default TCP port checked when none is given (HTTPS).
pub const DEFAULT_PORT: u16 = 443;

/// Default timeout in seconds for every network operation of a run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// DNS port used when a nameserver is given without one.
pub const DNS_PORT: u16 = 53;

/// Maximum UDP payload advertised in the EDNS0 OPT record when DNSSEC is required.
pub const EDNS_MAX_PAYLOAD: u16 = 1280;

/// Name announced in the SMTP `EHLO` command.
pub const DEFAULT_CLIENT_NAME: &str = "localhost";

/// Maximum size in bytes of a single plaintext reply during STARTTLS negotiation.
/// Protects against a peer that streams data without ever ending a line.
pub const MAX_REPLY_BYTES: usize = 64 * 1024;

/// Maximum number of lines in a multi-line SMTP/IMAP/FTP reply.
pub const MAX_REPLY_LINES: usize = 512;

/// Name of the check printed at the start of the status line.
pub const CHECK_NAME: &str = "DANE";
