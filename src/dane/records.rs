//! TLSA record model.
//!
//! Field values follow the IANA registries of RFC 6698 section 7. Values
//! outside the registries are valid on the wire, so they are kept as
//! `Unknown` rather than rejected; the matcher treats them as non-matching.

use std::fmt;

/// TLSA certificate usage (RFC 6698 section 2.1.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CertificateUsage {
    /// 0: CA constraint, requires PKIX validation.
    PkixTa,
    /// 1: service certificate constraint, requires PKIX validation.
    PkixEe,
    /// 2: trust anchor assertion.
    DaneTa,
    /// 3: domain-issued certificate.
    DaneEe,
    /// Any unassigned or private value.
    Unknown(u8),
}

impl From<u8> for CertificateUsage {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::PkixTa,
            1 => Self::PkixEe,
            2 => Self::DaneTa,
            3 => Self::DaneEe,
            other => Self::Unknown(other),
        }
    }
}

impl From<CertificateUsage> for u8 {
    fn from(usage: CertificateUsage) -> Self {
        match usage {
            CertificateUsage::PkixTa => 0,
            CertificateUsage::PkixEe => 1,
            CertificateUsage::DaneTa => 2,
            CertificateUsage::DaneEe => 3,
            CertificateUsage::Unknown(other) => other,
        }
    }
}

/// Part of the certificate the association data refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// 0: the full DER-encoded certificate.
    FullCertificate,
    /// 1: the DER-encoded SubjectPublicKeyInfo.
    SubjectPublicKeyInfo,
    /// Any unassigned or private value.
    Unknown(u8),
}

impl From<u8> for Selector {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::FullCertificate,
            1 => Self::SubjectPublicKeyInfo,
            other => Self::Unknown(other),
        }
    }
}

impl From<Selector> for u8 {
    fn from(selector: Selector) -> Self {
        match selector {
            Selector::FullCertificate => 0,
            Selector::SubjectPublicKeyInfo => 1,
            Selector::Unknown(other) => other,
        }
    }
}

/// How the association data is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchingType {
    /// 0: exact match on the selected content.
    Full,
    /// 1: SHA-256 of the selected content.
    Sha256,
    /// 2: SHA-512 of the selected content.
    Sha512,
    /// Any unassigned or private value.
    Unknown(u8),
}

impl From<u8> for MatchingType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Full,
            1 => Self::Sha256,
            2 => Self::Sha512,
            other => Self::Unknown(other),
        }
    }
}

impl From<MatchingType> for u8 {
    fn from(matching_type: MatchingType) -> Self {
        match matching_type {
            MatchingType::Full => 0,
            MatchingType::Sha256 => 1,
            MatchingType::Sha512 => 2,
            MatchingType::Unknown(other) => other,
        }
    }
}

/// One TLSA resource record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TlsaRecord {
    /// Certificate usage field
    pub usage: CertificateUsage,
    /// Selector field
    pub selector: Selector,
    /// Matching type field
    pub matching_type: MatchingType,
    /// Certificate association data
    pub association_data: Vec<u8>,
}

impl TlsaRecord {
    /// Builds a record from its raw wire fields.
    pub fn new(usage: u8, selector: u8, matching_type: u8, association_data: Vec<u8>) -> Self {
        Self {
            usage: usage.into(),
            selector: selector.into(),
            matching_type: matching_type.into(),
            association_data,
        }
    }
}

/// Presentation format, e.g. `3 1 1 0C72AC70...`.
impl fmt::Display for TlsaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            u8::from(self.usage),
            u8::from(self.selector),
            u8::from(self.matching_type),
            hex::encode_upper(&self.association_data)
        )
    }
}
