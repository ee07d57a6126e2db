//! DANE certificate matching (RFC 6698 section 2.1).

use sha2::{Digest, Sha256, Sha512};

use super::records::{CertificateUsage, MatchingType, Selector, TlsaRecord};

/// Evaluates one TLSA record against the presented end-entity certificate.
///
/// Only end-entity usages are supported: DANE-EE (3) always qualifies and
/// PKIX-EE (1) qualifies only when `pkix_valid` is set. PKIX-TA (0) and
/// DANE-TA (2) never match, nor does any unknown usage, selector or
/// matching type.
///
/// The function is pure: it only reads its arguments.
pub fn matches(cert_der: &[u8], pkix_valid: bool, record: &TlsaRecord) -> bool {
    match record.usage {
        CertificateUsage::DaneEe => {}
        CertificateUsage::PkixEe if pkix_valid => {}
        _ => return false,
    }

    let subject = match record.selector {
        Selector::FullCertificate => cert_der,
        Selector::SubjectPublicKeyInfo => match subject_public_key_info(cert_der) {
            Some(spki) => spki,
            None => return false,
        },
        Selector::Unknown(_) => return false,
    };

    let expected = record.association_data.as_slice();
    match record.matching_type {
        MatchingType::Full => subject == expected,
        MatchingType::Sha256 => Sha256::digest(subject).as_slice() == expected,
        MatchingType::Sha512 => Sha512::digest(subject).as_slice() == expected,
        MatchingType::Unknown(_) => false,
    }
}

/// Returns every record that matches, in resolver order.
pub fn matching_records(
    cert_der: &[u8],
    pkix_valid: bool,
    records: &[TlsaRecord],
) -> Vec<TlsaRecord> {
    records
        .iter()
        .filter(|record| matches(cert_der, pkix_valid, record))
        .cloned()
        .collect()
}

/// Slices the DER-encoded SubjectPublicKeyInfo out of a certificate.
pub(crate) fn subject_public_key_info(cert_der: &[u8]) -> Option<&[u8]> {
    match x509_parser::parse_x509_certificate(cert_der) {
        Ok((_, cert)) => Some(cert.tbs_certificate.subject_pki.raw),
        Err(e) => {
            log::debug!("Cannot extract SubjectPublicKeyInfo: {e}");
            None
        }
    }
}
