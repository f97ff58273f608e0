//! Client secret hashing.
//!
//! SHA-256 hex digest of the UTF-8 plaintext, no salt — secrets are
//! high-entropy random tokens, not user-chosen passwords, so salting buys
//! nothing here. Comparison goes through `constant_time_eq` rather than
//! `==` so hash comparison time doesn't leak information about a guess.

use constant_time_eq::constant_time_eq;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

pub fn hash_secret(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)
}

pub fn verify_secret(plaintext: &str, hash: &str) -> bool {
    let computed = hash_secret(plaintext);
    constant_time_eq(computed.as_bytes(), hash.as_bytes())
}

/// Mints a fresh high-entropy plaintext client secret. Returned once by the
/// store on client creation and rotation, never persisted or retrievable
/// again — only its hash is stored.
pub fn generate_secret_plaintext() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect();
    format!("sk_{suffix}")
}
