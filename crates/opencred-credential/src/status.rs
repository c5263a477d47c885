//! # Verification Status Derivation
//!
//! The rule order applied on every verification attempt. First match
//! wins:
//!
//! 1. persisted status `revoked` → `revoked`
//! 2. persisted status `expired`, or `valid_until` in the past → `expired`
//! 3. issuer institution not verified → `invalid`
//! 4. otherwise → `verified`
//!
//! `revoked` is a persisted, terminal state; `expired` is usually derived
//! at read time from `valid_until` without being written back.

use chrono::{DateTime, SecondsFormat, Utc};

use opencred_core::{CredentialStatus, VerificationStatus};

/// Inputs to status derivation, read from a stored credential joined
/// with its issuer.
#[derive(Debug, Clone)]
pub struct StatusInputs<'a> {
    pub status: CredentialStatus,
    pub valid_until: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<&'a str>,
    pub issuer_verified: bool,
}

/// Result of status derivation: the reported status plus the
/// human-readable reason returned to the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedStatus {
    pub status: VerificationStatus,
    pub reason: String,
}

/// Whether a credential with the given `valid_until` is expired at `now`.
pub fn is_expired_at(valid_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(valid_until, Some(until) if until < now)
}

/// Whether a credential in the given status may be revoked.
///
/// Revocation is one-way: an already-revoked credential can never be
/// revoked again (or reactivated).
pub fn can_revoke(status: CredentialStatus) -> bool {
    status != CredentialStatus::Revoked
}

/// Apply the verification rule order.
pub fn derive_verification_status(inputs: &StatusInputs<'_>, now: DateTime<Utc>) -> DerivedStatus {
    if inputs.status == CredentialStatus::Revoked {
        let revoked_at = inputs
            .revoked_at
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| "an unknown date".to_string());
        let reason = inputs.revocation_reason.unwrap_or("Not specified");
        return DerivedStatus {
            status: VerificationStatus::Revoked,
            reason: format!("Credential was revoked on {revoked_at}. Reason: {reason}"),
        };
    }

    if inputs.status == CredentialStatus::Expired || is_expired_at(inputs.valid_until, now) {
        let reason = match inputs.valid_until {
            Some(until) => format!(
                "Credential expired on {}",
                until.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            None => "Credential has expired".to_string(),
        };
        return DerivedStatus {
            status: VerificationStatus::Expired,
            reason,
        };
    }

    if !inputs.issuer_verified {
        return DerivedStatus {
            status: VerificationStatus::Invalid,
            reason: "Issuing institution is not verified".to_string(),
        };
    }

    DerivedStatus {
        status: VerificationStatus::Verified,
        reason: "Credential is valid and verified".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn active_inputs() -> StatusInputs<'static> {
        StatusInputs {
            status: CredentialStatus::Active,
            valid_until: None,
            revoked_at: None,
            revocation_reason: None,
            issuer_verified: true,
        }
    }

    #[test]
    fn active_verified_issuer_is_verified() {
        let derived = derive_verification_status(&active_inputs(), now());
        assert_eq!(derived.status, VerificationStatus::Verified);
        assert_eq!(derived.reason, "Credential is valid and verified");
    }

    #[test]
    fn revoked_wins_over_everything() {
        let inputs = StatusInputs {
            status: CredentialStatus::Revoked,
            valid_until: Some(now() - chrono::Duration::days(1)),
            revoked_at: Some(now() - chrono::Duration::hours(2)),
            revocation_reason: Some("issued in error"),
            issuer_verified: false,
        };
        let derived = derive_verification_status(&inputs, now());
        assert_eq!(derived.status, VerificationStatus::Revoked);
        assert!(derived.reason.contains("issued in error"));
    }

    #[test]
    fn revoked_without_reason_says_not_specified() {
        let inputs = StatusInputs {
            status: CredentialStatus::Revoked,
            revoked_at: Some(now()),
            ..active_inputs()
        };
        let derived = derive_verification_status(&inputs, now());
        assert!(derived.reason.contains("Not specified"));
    }

    #[test]
    fn past_valid_until_derives_expired() {
        let inputs = StatusInputs {
            valid_until: Some(now() - chrono::Duration::seconds(1)),
            ..active_inputs()
        };
        let derived = derive_verification_status(&inputs, now());
        assert_eq!(derived.status, VerificationStatus::Expired);
        assert!(derived.reason.contains("Credential expired on"));
    }

    #[test]
    fn future_valid_until_is_not_expired() {
        let inputs = StatusInputs {
            valid_until: Some(now() + chrono::Duration::days(365)),
            ..active_inputs()
        };
        let derived = derive_verification_status(&inputs, now());
        assert_eq!(derived.status, VerificationStatus::Verified);
    }

    #[test]
    fn persisted_expired_status_wins_without_valid_until() {
        let inputs = StatusInputs {
            status: CredentialStatus::Expired,
            ..active_inputs()
        };
        let derived = derive_verification_status(&inputs, now());
        assert_eq!(derived.status, VerificationStatus::Expired);
    }

    #[test]
    fn unverified_issuer_is_invalid() {
        let inputs = StatusInputs {
            issuer_verified: false,
            ..active_inputs()
        };
        let derived = derive_verification_status(&inputs, now());
        assert_eq!(derived.status, VerificationStatus::Invalid);
        assert_eq!(derived.reason, "Issuing institution is not verified");
    }

    #[test]
    fn expiry_checked_before_issuer_verification() {
        let inputs = StatusInputs {
            valid_until: Some(now() - chrono::Duration::days(1)),
            issuer_verified: false,
            ..active_inputs()
        };
        let derived = derive_verification_status(&inputs, now());
        assert_eq!(derived.status, VerificationStatus::Expired);
    }

    #[test]
    fn pending_with_verified_issuer_reports_verified() {
        // The rule order has no pending arm: a pending credential that
        // passes rules 1-3 reports verified.
        let inputs = StatusInputs {
            status: CredentialStatus::Pending,
            ..active_inputs()
        };
        let derived = derive_verification_status(&inputs, now());
        assert_eq!(derived.status, VerificationStatus::Verified);
    }

    #[test]
    fn can_revoke_only_non_revoked() {
        assert!(can_revoke(CredentialStatus::Active));
        assert!(can_revoke(CredentialStatus::Pending));
        assert!(can_revoke(CredentialStatus::Expired));
        assert!(!can_revoke(CredentialStatus::Revoked));
    }

    #[test]
    fn is_expired_at_boundary() {
        assert!(!is_expired_at(Some(now()), now()));
        assert!(is_expired_at(
            Some(now() - chrono::Duration::milliseconds(1)),
            now()
        ));
        assert!(!is_expired_at(None, now()));
    }
}
