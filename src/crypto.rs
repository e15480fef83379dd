//! Secret hashing and license key generation.
//!
//! Secrets (admin token, tenant passwords) are never compared as plain strings:
//! both sides are reduced to a domain-separated SHA-256 digest and compared in
//! constant time.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Unambiguous alphabet for license keys (no 0/O, 1/I/L).
const KEY_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Groups of [`KEY_GROUP_LEN`] characters after the prefix.
const KEY_GROUPS: usize = 6;
const KEY_GROUP_LEN: usize = 4;

/// Hex-encoded SHA-256 of `input`, prefixed with a version tag.
pub fn hash_secret(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"donation-relay-v1:");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a presented secret against a stored digest without early exit.
pub fn verify_secret(presented: &str, expected_hash: &str) -> bool {
    let presented_hash = hash_secret(presented);
    let expected = expected_hash.trim().to_ascii_lowercase();
    presented_hash.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Generate a license key: `PREFIX-XXXX-XXXX-XXXX-XXXX-XXXX-XXXX`.
///
/// 24 characters over a 31-symbol alphabet gives roughly 118 bits of entropy.
/// Uniqueness against existing keys is the caller's job.
pub fn generate_license_key(prefix: &str) -> String {
    let mut rng = rand::thread_rng();

    let mut part = || -> String {
        (0..KEY_GROUP_LEN)
            .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
            .collect()
    };

    let groups: Vec<String> = (0..KEY_GROUPS).map(|_| part()).collect();
    format!("{}-{}", prefix, groups.join("-"))
}
