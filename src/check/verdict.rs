//! Check verdict and its monitoring-plugin rendering.

use std::fmt;

use crate::config::CHECK_NAME;

/// Severity of a check result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    /// A TLSA record matched and no expiry threshold was crossed
    Ok,
    /// A TLSA record matched but the certificate expires soon
    Warning,
    /// No TLSA record, no match, PKIX failure when required, or imminent expiry
    Critical,
    /// The check could not be carried out
    Unknown,
}

impl Status {
    /// Process exit code: 0, 1, 2 or 3.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Terminal result of one check.
///
/// Rendered as `DANE <STATUS> - <message>`, followed by one line per detail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    /// Severity
    pub status: Status,
    /// One-line summary
    pub message: String,
    /// Additional lines, e.g. matched records and certificate fields
    pub details: Vec<String>,
}

impl Verdict {
    /// Creates a verdict without details.
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Shorthand for an `UNKNOWN` verdict.
    pub fn unknown(message: impl fmt::Display) -> Self {
        Self::new(Status::Unknown, message.to_string())
    }

    /// Shorthand for a `CRITICAL` verdict.
    pub fn critical(message: impl fmt::Display) -> Self {
        Self::new(Status::Critical, message.to_string())
    }

    /// Replaces the detail lines.
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Process exit code of the verdict's status.
    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CHECK_NAME} {} - {}", self.status, self.message)?;
        for line in &self.details {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}
