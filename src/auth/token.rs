//! One-time tokens for account activation and password reset.
//!
//! The plain token goes to the user by mail; only its SHA-256 digest is
//! persisted.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A freshly minted one-time token and the digest to store for it.
#[derive(Debug, Clone)]
pub struct OneTimeToken {
    pub plain: String,
    pub hash: String,
}

impl OneTimeToken {
    pub fn generate() -> Self {
        let plain = Uuid::new_v4().to_string();
        let hash = hash_token(&plain);
        Self { plain, hash }
    }
}

/// Hex-encoded SHA-256 of `plain`.
pub fn hash_token(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn generated_token_matches_its_hash() {
        let token = OneTimeToken::generate();
        assert_eq!(token.hash, hash_token(&token.plain));
        assert!(Uuid::parse_str(&token.plain).is_ok());
    }
}
