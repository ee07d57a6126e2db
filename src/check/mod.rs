//! Trust decision.
//!
//! This module sequences one check:
//! 1. Resolve the TLSA record set
//! 2. Decide whether PKIX validation must be enforced
//! 3. Fetch the peer certificate, downgrading once on a trust failure
//! 4. Match every record against the certificate
//! 5. Fold in certificate expiry
//!
//! Every failure ends in exactly one [`Verdict`]; nothing here prints or exits.

mod expiry;
mod verdict;


use chrono::{DateTime, Utc};

use crate::config::{Config, MinValidity};
use crate::dane::{matching_records, CertificateUsage, TlsaRecord};
use crate::dns::{lookup_tlsa, TlsaQuery};
use crate::error_handling::{ConnectError, ResolveError};
use crate::initialization::nameserver_address;
use crate::tls::{fetch_certificate, CertificateMaterial, ConnectTarget};

use expiry::expiry_status;
pub use verdict::{Status, Verdict};

/// Provides the TLSA record set of the checked service.
#[allow(async_fn_in_trait)]
pub trait TlsaSource {
    /// Returns the records in the order the resolver delivered them.
    async fn tlsa_records(&self) -> Result<Vec<TlsaRecord>, ResolveError>;
}

/// Provides the certificate presented by the checked service.
#[allow(async_fn_in_trait)]
pub trait CertificateSource {
    /// Connects once and returns the end-entity certificate.
    ///
    /// With `verify_pkix` set, an untrusted chain or a hostname mismatch must
    /// be reported as [`ConnectError::Trust`].
    async fn peer_certificate(
        &self,
        verify_pkix: bool,
    ) -> Result<CertificateMaterial, ConnectError>;
}

impl TlsaSource for TlsaQuery {
    async fn tlsa_records(&self) -> Result<Vec<TlsaRecord>, ResolveError> {
        lookup_tlsa(self).await
    }
}

impl CertificateSource for ConnectTarget {
    async fn peer_certificate(
        &self,
        verify_pkix: bool,
    ) -> Result<CertificateMaterial, ConnectError> {
        fetch_certificate(self, verify_pkix).await
    }
}

/// What the caller asked the check to enforce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckPolicy {
    /// Require a PKIX-valid chain; a trust failure is then final
    pub check_pkix: bool,
    /// Expiry thresholds, applied to PKIX-valid matches only
    pub min_validity: Option<MinValidity>,
    /// Require DNSSEC-authenticated TLSA records
    pub dnssec_required: bool,
}

impl From<&Config> for CheckPolicy {
    fn from(config: &Config) -> Self {
        Self {
            check_pkix: config.check_pkix,
            min_validity: config.min_validity,
            dnssec_required: !config.insecure,
        }
    }
}

/// Result of matching the record set against the presented certificate.
#[derive(Debug)]
struct ValidationOutcome {
    matched: Vec<TlsaRecord>,
    pkix_valid: bool,
    pkix_error: Option<String>,
}

fn join_records(records: &[TlsaRecord]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn expiry_note(days: i64) -> String {
    if days < 0 {
        format!("certificate expired {} days ago", -days)
    } else {
        format!("certificate expires in {days} days")
    }
}

/// Runs the check against the given sources and returns its verdict.
///
/// `now` is the reference time for the expiry thresholds.
pub async fn run_check<T, C>(
    policy: &CheckPolicy,
    tlsa: &T,
    certificates: &C,
    now: DateTime<Utc>,
) -> Verdict
where
    T: TlsaSource,
    C: CertificateSource,
{
    let mut verdict = decide(policy, tlsa, certificates, now).await;
    if !policy.dnssec_required {
        verdict
            .message
            .push_str(" (DNSSEC authentication not enforced)");
    }
    log::info!("Verdict: {} - {}", verdict.status, verdict.message);
    verdict
}

async fn decide<T, C>(
    policy: &CheckPolicy,
    tlsa: &T,
    certificates: &C,
    now: DateTime<Utc>,
) -> Verdict
where
    T: TlsaSource,
    C: CertificateSource,
{
    let records = match tlsa.tlsa_records().await {
        Ok(records) => records,
        Err(e @ ResolveError::NoRecord(_)) => return Verdict::critical(e),
        Err(e) => return Verdict::unknown(e),
    };
    for record in &records {
        log::debug!("TLSA record: {record}");
    }

    // A PKIX-EE record can never match without a validated chain
    let enforce = policy.check_pkix
        || records
            .iter()
            .any(|record| record.usage == CertificateUsage::PkixEe);
    log::debug!(
        "PKIX validation {}",
        if enforce { "enforced" } else { "not enforced" }
    );

    let (certificate, pkix_valid, pkix_error) = match certificates.peer_certificate(enforce).await
    {
        Ok(certificate) => (certificate, enforce, None),
        Err(ConnectError::Trust(reason)) if enforce => {
            if policy.check_pkix {
                return Verdict::critical(format!("PKIX validation failed: {reason}"));
            }
            log::warn!("PKIX validation failed ({reason}), retrying without verification");
            match certificates.peer_certificate(false).await {
                Ok(certificate) => (certificate, false, Some(reason)),
                Err(e) => return Verdict::unknown(e),
            }
        }
        Err(e) => return Verdict::unknown(e),
    };

    let outcome = ValidationOutcome {
        matched: matching_records(&certificate.der, pkix_valid, &records),
        pkix_valid,
        pkix_error,
    };

    let mut details: Vec<String> = outcome
        .matched
        .iter()
        .map(|record| format!("Matched TLSA record: {record}"))
        .collect();
    details.push(format!("Certificate subject: {}", certificate.subject));
    details.push(format!(
        "Certificate expires: {}",
        certificate.not_after.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if outcome.matched.is_empty() {
        let mut message = String::from("No TLSA record matched the presented certificate");
        if let Some(error) = &outcome.pkix_error {
            let hypothetical = matching_records(&certificate.der, true, &records);
            if hypothetical.is_empty() {
                message.push_str(&format!("; PKIX validation failed: {error}"));
            } else {
                message.push_str(&format!(
                    "; would have matched {} but PKIX validation failed: {error}",
                    join_records(&hypothetical)
                ));
            }
        }
        return Verdict::critical(message).with_details(details);
    }

    let mut message = match outcome.matched.as_slice() {
        [record] => format!("Certificate matches TLSA record {record}"),
        matched => format!(
            "Certificate matches {} TLSA records: {}",
            matched.len(),
            join_records(matched)
        ),
    };

    let mut status = Status::Ok;
    if let (true, Some(thresholds)) = (outcome.pkix_valid, policy.min_validity) {
        let days = certificate.days_remaining(now);
        status = expiry_status(days, &thresholds);
        log::debug!("Certificate valid for {days} more days ({thresholds}): {status}");
        if status != Status::Ok {
            message.push_str(&format!("; {}", expiry_note(days)));
        }
    }
    if let Some(error) = &outcome.pkix_error {
        message.push_str(&format!("; PKIX validation failed: {error}"));
    }

    Verdict::new(status, message).with_details(details)
}

/// Runs a complete check for `config`.
///
/// Configuration errors are reported as `UNKNOWN` before any network activity.
pub async fn run(config: &Config) -> Verdict {
    if let Err(e) = config.validate() {
        return Verdict::unknown(e);
    }
    let nameserver = match nameserver_address(config.nameserver.as_deref()) {
        Ok(nameserver) => nameserver,
        Err(e) => return Verdict::unknown(e),
    };

    let query = TlsaQuery {
        host: config.host.clone(),
        port: config.port,
        dnssec_required: !config.insecure,
        nameserver,
        timeout: config.timeout(),
    };
    let target = ConnectTarget {
        host: config.host.clone(),
        connect_host: config.connect_host().to_string(),
        connect_port: config.connect_port(),
        starttls: config.starttls,
        client_name: config.client_name.clone(),
        timeout: config.timeout(),
    };

    run_check(&CheckPolicy::from(config), &query, &target, Utc::now()).await
}
