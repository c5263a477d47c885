//! # Local Claim Hashing
//!
//! Recomputes a credential claim digest without talking to the API —
//! the client-side preview of the `credential_hash` issuance will
//! store. Feeding back the fields of an issued credential reproduces
//! its stored hash exactly.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use opencred_core::{CredentialId, CredentialType, Did};
use opencred_credential::CredentialClaims;

/// Arguments for the `hash` subcommand.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Human-readable credential identifier.
    #[arg(long)]
    credential_id: String,

    /// Issuer DID.
    #[arg(long)]
    issuer_did: Option<String>,

    /// Subject DID.
    #[arg(long)]
    subject_did: Option<String>,

    /// Credential type.
    #[arg(long = "type")]
    credential_type: String,

    /// Credential title.
    #[arg(long)]
    title: String,

    /// Optional description.
    #[arg(long)]
    description: Option<String>,

    /// Optional metadata as a JSON object string.
    #[arg(long)]
    metadata: Option<String>,

    /// Issuance timestamp (RFC 3339).
    #[arg(long)]
    issued_at: String,

    /// Optional expiry timestamp (RFC 3339).
    #[arg(long)]
    valid_until: Option<String>,

    /// Issuer display name.
    #[arg(long)]
    issuer_name: String,
}

/// Compute and print the claim digest.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let claims = CredentialClaims {
        credential_id: CredentialId::new(&args.credential_id)?,
        issuer_did: args.issuer_did.as_deref().map(Did::new).transpose()?,
        subject_did: args.subject_did.as_deref().map(Did::new).transpose()?,
        credential_type: CredentialType::parse(&args.credential_type)?,
        title: args.title.clone(),
        description: args.description.clone(),
        metadata: args
            .metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("--metadata is not valid JSON")?,
        issued_at: args
            .issued_at
            .parse::<DateTime<Utc>>()
            .context("--issued-at is not a valid RFC 3339 timestamp")?,
        valid_until: args
            .valid_until
            .as_deref()
            .map(str::parse::<DateTime<Utc>>)
            .transpose()
            .context("--valid-until is not a valid RFC 3339 timestamp")?,
        issuer_name: args.issuer_name.clone(),
    };

    println!("{}", claims.digest()?.to_hex());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> HashArgs {
        HashArgs {
            credential_id: "OC-TEST-1".to_string(),
            issuer_did: Some("did:opencred:inst-1".to_string()),
            subject_did: Some("did:opencred:0xabc1".to_string()),
            credential_type: "degree".to_string(),
            title: "BSc".to_string(),
            description: None,
            metadata: None,
            issued_at: "2025-06-01T12:00:00Z".to_string(),
            valid_until: None,
            issuer_name: "Test University".to_string(),
        }
    }

    #[test]
    fn hash_command_succeeds_on_valid_input() {
        assert_eq!(run_hash(&args()).unwrap(), 0);
    }

    #[test]
    fn hash_command_rejects_bad_type() {
        let mut bad = args();
        bad.credential_type = "diploma".to_string();
        assert!(run_hash(&bad).is_err());
    }

    #[test]
    fn hash_command_rejects_bad_timestamp() {
        let mut bad = args();
        bad.issued_at = "yesterday".to_string();
        assert!(run_hash(&bad).is_err());
    }
}
