//! Peer certificate field extraction.

use chrono::{DateTime, Utc};

use crate::error_handling::ConnectError;

/// The end-entity certificate presented by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateMaterial {
    /// DER encoding, as matched against TLSA records
    pub der: Vec<u8>,
    /// Subject distinguished name, e.g. `CN=www.example.org`
    pub subject: String,
    /// End of the validity period
    pub not_after: DateTime<Utc>,
}

impl CertificateMaterial {
    /// Parses the fields used by the check from a DER certificate.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::Certificate` if the certificate cannot be parsed
    /// or its expiry date is out of range.
    pub fn from_der(der: Vec<u8>) -> Result<Self, ConnectError> {
        let (_, cert) = x509_parser::parse_x509_certificate(&der)
            .map_err(|e| ConnectError::Certificate(e.to_string()))?;
        let subject = cert.subject().to_string();
        let timestamp = cert.validity().not_after.timestamp();
        let not_after = DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
            ConnectError::Certificate(format!("expiry timestamp {timestamp} out of range"))
        })?;
        Ok(Self {
            der,
            subject,
            not_after,
        })
    }

    /// Whole days from `now` until expiry, negative once expired.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.not_after - now).num_days()
    }
}
