// src/backend/utils/crypto.rs
// Hashing and id-generation helpers.

use crate::utils::rng::with_rng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a generated document id (hex-encoded to 32 chars).
const ID_BYTES: usize = 16;

/// Generates an opaque random id for reports, slides and similar documents.
pub fn new_id() -> String {
    let mut bytes = [0u8; ID_BYTES];
    with_rng(|rng| rng.fill_bytes(&mut bytes));
    hex::encode(bytes)
}

/// Calculates the SHA256 hash of byte data and returns it as a hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Hashes a share-link password. Plain SHA-256 hex, matching what the public
/// viewer compares against. This is a convenience gate, not an authentication
/// credential.
pub fn hash_password(password: &str) -> String {
    sha256_hex(password.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_matches_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn new_id_is_32_hex_chars_and_unique() {
        let a = new_id();
        let b = new_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
