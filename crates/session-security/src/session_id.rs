//! Opaque session identifiers

use rand::RngCore;
use sha2::{Digest, Sha256};

/// 256 bits of CSPRNG output per identifier.
pub const SESSION_ID_BYTES: usize = 32;

const FINGERPRINT_LEN: usize = 12;

/// Generates a fresh, structureless session identifier (64 hex chars).
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Short SHA-256 prefix of a secret, safe to put in logs.
pub fn fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

/// Compares two shared secrets without short-circuiting on the first
/// differing byte. Both sides are hashed first so lengths leak nothing.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
