//! # SHA-256 Digest Computation
//!
//! Computes [`ContentDigest`] values from [`CanonicalBytes`].
//!
//! ## Security Invariant
//!
//! The function signature requires `CanonicalBytes` — not raw `&[u8]`.
//! This ensures that every digest was computed from properly
//! canonicalized data, so a credential hash can always be reproduced by
//! re-canonicalizing the same claim object.

use opencred_core::{sha256_digest as core_sha256_digest, CanonicalBytes, ContentDigest};

/// Compute a SHA-256 content digest from canonical bytes.
///
/// Delegates to [`opencred_core::sha256_digest()`] — the single
/// implementation in the workspace.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    core_sha256_digest(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sha256_digest_produces_64_hex_chars() {
        let canonical = CanonicalBytes::new(&json!({"key": "value"})).unwrap();
        let digest = sha256_digest(&canonical);
        assert_eq!(digest.to_hex().len(), 64);
        assert!(digest.to_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sha256_digest_agrees_with_core() {
        let canonical = CanonicalBytes::new(&json!({"test": "agreement"})).unwrap();
        assert_eq!(sha256_digest(&canonical), core_sha256_digest(&canonical));
    }
}
