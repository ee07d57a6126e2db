//! Certificate expiry thresholds.

use super::Status;
use crate::config::MinValidity;

/// Status for a certificate with `days_remaining` days of validity left.
///
/// Fewer days than the critical threshold is `Critical`, fewer than the
/// warning threshold is `Warning`.
pub(crate) fn expiry_status(days_remaining: i64, thresholds: &MinValidity) -> Status {
    if let Some(critical) = thresholds.critical {
        if days_remaining < i64::from(critical) {
            return Status::Critical;
        }
    }
    if days_remaining < i64::from(thresholds.warning) {
        return Status::Warning;
    }
    Status::Ok
}
