//! # Credential Identifier Generation
//!
//! Identifiers look like `OC-MDK3J2A1-4F7Q9Z2X`: the issuance timestamp
//! in base 36 plus an 8-character random base-36 suffix, uppercased.
//! They are display identifiers, not integrity anchors — the credential
//! hash is what verification trusts.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};

use opencred_core::CredentialId;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a credential identifier for a credential issued at `now`.
pub fn generate_credential_id(now: DateTime<Utc>) -> CredentialId {
    let millis = now.timestamp_millis().max(0) as u64;
    let id = format!("OC-{}-{}", to_base36(millis), random_base36(8)).to_uppercase();
    CredentialId::new(id).expect("generated identifier is non-empty and bounded")
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ASCII")
}

fn random_base36(len: usize) -> String {
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = (OsRng.next_u32() % 36) as usize;
        out.push(BASE36[idx] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn identifier_has_expected_shape() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let id = generate_credential_id(now);
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "OC");
        assert_eq!(parts[2].len(), 8);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn timestamp_part_encodes_issuance_time() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let id = generate_credential_id(now);
        let ts_part = id.as_str().split('-').nth(1).unwrap();
        assert_eq!(
            ts_part,
            to_base36(now.timestamp_millis() as u64).to_uppercase()
        );
    }

    #[test]
    fn identifiers_are_unique() {
        let now = Utc::now();
        let a = generate_credential_id(now);
        let b = generate_credential_id(now);
        assert_ne!(a, b);
    }

    #[test]
    fn base36_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
