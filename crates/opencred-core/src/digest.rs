//! # Canonical Bytes and Content Digests
//!
//! The registry identifies a credential by the hex SHA-256 digest of its
//! canonical claim object. To keep that digest reproducible, the digest
//! function does not accept raw byte slices: callers first canonicalize a
//! serializable value into [`CanonicalBytes`], then hash it. Canonical
//! form is the compact JSON encoding of the value with the field order
//! fixed by the Rust struct definition and absent optional fields
//! omitted.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Canonical byte encoding of a serializable value.
///
/// Construction is the only way to obtain one, which makes "hash of
/// non-canonical bytes" unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize a serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Canonicalization`] when the value cannot
    /// be encoded as JSON (e.g. a map with non-string keys).
    pub fn new<T: Serialize>(value: &T) -> Result<Self, ValidationError> {
        serde_json::to_vec(value)
            .map(Self)
            .map_err(|e| ValidationError::Canonicalization(e.to_string()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A SHA-256 content digest, rendered as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Render the digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for b in &self.0 {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }

    /// Parse a digest from 64 hex characters (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDigest`] on wrong length or
    /// non-hex input.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        if s.len() != 64 {
            return Err(ValidationError::InvalidDigest(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hi = hex_val(chunk[0]).ok_or_else(|| ValidationError::InvalidDigest(s.to_string()))?;
            let lo = hex_val(chunk[1]).ok_or_else(|| ValidationError::InvalidDigest(s.to_string()))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(D::Error::custom)
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// The single digest computation path in the workspace.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    ContentDigest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_is_64_hex_chars() {
        let canonical = CanonicalBytes::new(&json!({"key": "value"})).unwrap();
        let digest = sha256_digest(&canonical);
        assert_eq!(digest.to_hex().len(), 64);
        assert!(digest.to_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_is_deterministic() {
        let canonical = CanonicalBytes::new(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(sha256_digest(&canonical), sha256_digest(&canonical));
    }

    #[test]
    fn different_input_different_digest() {
        let c1 = CanonicalBytes::new(&json!({"x": 1})).unwrap();
        let c2 = CanonicalBytes::new(&json!({"x": 2})).unwrap();
        assert_ne!(sha256_digest(&c1), sha256_digest(&c2));
    }

    #[test]
    fn digest_matches_known_vector() {
        // SHA-256 of the literal bytes `{}`.
        let canonical = CanonicalBytes::new(&json!({})).unwrap();
        assert_eq!(
            sha256_digest(&canonical).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn hex_round_trip() {
        let canonical = CanonicalBytes::new(&json!({"round": "trip"})).unwrap();
        let digest = sha256_digest(&canonical);
        let parsed = ContentDigest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn from_hex_accepts_uppercase() {
        let canonical = CanonicalBytes::new(&json!({"k": true})).unwrap();
        let digest = sha256_digest(&canonical);
        let upper = digest.to_hex().to_uppercase();
        assert_eq!(ContentDigest::from_hex(&upper).unwrap(), digest);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(ContentDigest::from_hex("abc").is_err());
        assert!(ContentDigest::from_hex(&"z".repeat(64)).is_err());
    }

    #[test]
    fn serde_round_trip_as_hex_string() {
        let canonical = CanonicalBytes::new(&json!({"s": "erde"})).unwrap();
        let digest = sha256_digest(&canonical);
        let encoded = serde_json::to_string(&digest).unwrap();
        assert_eq!(encoded, format!("\"{}\"", digest.to_hex()));
        let decoded: ContentDigest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, digest);
    }
}
