//! # Share Token Generation
//!
//! Share tokens are 256-bit values drawn from the operating system RNG
//! and rendered as 64 lowercase hex characters. There is no collision
//! check anywhere in the registry — at 256 bits the probability is
//! negligible.

use rand_core::{OsRng, RngCore};

use opencred_core::ShareToken;

/// Generate a fresh 256-bit share token.
pub fn generate_share_token() -> ShareToken {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let mut hex = String::with_capacity(64);
    for b in bytes {
        hex.push_str(&format!("{b:02x}"));
    }
    ShareToken::new(hex).expect("generated token is 64 lowercase hex chars")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_lowercase_hex() {
        let token = generate_share_token();
        assert_eq!(token.as_str().len(), 64);
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn tokens_are_unique() {
        let a = generate_share_token();
        let b = generate_share_token();
        assert_ne!(a, b);
    }
}
