//! # Canonical Credential Claims
//!
//! The claim object a credential hash commits to. Canonical form is the
//! compact JSON encoding of this struct: field order is fixed by the
//! struct definition, `description` and `metadata` are omitted when
//! absent, and `validUntil` is always present (`null` when open-ended).
//! Timestamps are RFC 3339 UTC with millisecond precision.
//!
//! Changing this struct changes every digest computed from it — treat
//! the field set and order as a wire format.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use opencred_core::{CanonicalBytes, ContentDigest, CredentialId, CredentialType, Did, ValidationError};
use opencred_crypto::sha256_digest;

/// The canonical claim set hashed at issuance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialClaims {
    pub credential_id: CredentialId,
    pub issuer_did: Option<Did>,
    pub subject_did: Option<Did>,
    pub credential_type: CredentialType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(serialize_with = "ser_timestamp")]
    pub issued_at: DateTime<Utc>,
    #[serde(serialize_with = "ser_opt_timestamp")]
    pub valid_until: Option<DateTime<Utc>>,
    pub issuer_name: String,
}

impl CredentialClaims {
    /// Canonicalize and digest the claims.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Canonicalization`] when the metadata
    /// value cannot be encoded as JSON.
    pub fn digest(&self) -> Result<ContentDigest, ValidationError> {
        let canonical = CanonicalBytes::new(self)?;
        Ok(sha256_digest(&canonical))
    }
}

fn ser_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn ser_opt_timestamp<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => ser_timestamp(ts, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims() -> CredentialClaims {
        CredentialClaims {
            credential_id: CredentialId::new("OC-TEST-1").unwrap(),
            issuer_did: Some(Did::new("did:opencred:0xissuer").unwrap()),
            subject_did: Some(Did::new("did:opencred:0xsubject").unwrap()),
            credential_type: CredentialType::Degree,
            title: "BSc Computer Science".to_string(),
            description: None,
            metadata: None,
            issued_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            valid_until: None,
            issuer_name: "Test University".to_string(),
        }
    }

    #[test]
    fn digest_is_deterministic() {
        let c = claims();
        assert_eq!(c.digest().unwrap(), c.digest().unwrap());
    }

    #[test]
    fn digest_changes_with_any_field() {
        let base = claims().digest().unwrap();

        let mut c = claims();
        c.title = "MSc Computer Science".to_string();
        assert_ne!(c.digest().unwrap(), base);

        let mut c = claims();
        c.credential_type = CredentialType::Transcript;
        assert_ne!(c.digest().unwrap(), base);

        let mut c = claims();
        c.valid_until = Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        assert_ne!(c.digest().unwrap(), base);
    }

    #[test]
    fn canonical_form_omits_absent_optionals_and_keeps_valid_until_null() {
        let json = serde_json::to_string(&claims()).unwrap();
        assert!(!json.contains("\"description\""));
        assert!(!json.contains("\"metadata\""));
        assert!(json.contains("\"validUntil\":null"));
    }

    #[test]
    fn canonical_field_order_is_fixed() {
        let json = serde_json::to_string(&claims()).unwrap();
        let id_pos = json.find("credentialId").unwrap();
        let issuer_pos = json.find("issuerDid").unwrap();
        let subject_pos = json.find("subjectDid").unwrap();
        let issued_pos = json.find("issuedAt").unwrap();
        let name_pos = json.find("issuerName").unwrap();
        assert!(id_pos < issuer_pos && issuer_pos < subject_pos);
        assert!(subject_pos < issued_pos && issued_pos < name_pos);
    }

    #[test]
    fn timestamps_use_millisecond_precision() {
        let json = serde_json::to_string(&claims()).unwrap();
        assert!(json.contains("2025-06-01T12:00:00.000Z"));
    }

    #[test]
    fn present_description_participates_in_digest() {
        let without = claims().digest().unwrap();
        let mut c = claims();
        c.description = Some("with honors".to_string());
        assert_ne!(c.digest().unwrap(), without);
    }
}
