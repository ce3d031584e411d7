//! SHA-256 hashing for API keys.
//!
//! Only the digest of an API key is persisted; requests are authenticated by
//! hashing the presented key and looking the digest up.

use sha2::{Digest, Sha256};

/// Lowercase hex-encoded SHA-256 digest of `key`.
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_value() {
        // SHA-256 of empty string
        assert_eq!(
            hash_api_key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let hash = hash_api_key("av_test_key");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(hash, hash_api_key("av_other_key"));
    }
}
