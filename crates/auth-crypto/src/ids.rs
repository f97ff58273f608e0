//! Prefixed, time-ordered identifier generation.
//!
//! `"<prefix>_<26-char-lower-base32>"`: the first 10 characters are a
//! lowercase-base32 millisecond timestamp (ULID semantics, monotonic-ish
//! across the process), the remaining `random_length` characters are
//! cryptographic random, taken from the tail of a freshly minted ULID.

use thiserror::Error;
use ulid::Ulid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("random_length must be at least 6")]
    TooShort,
    #[error("random_length must be at most 16")]
    TooLong,
}

/// Generates a prefixed identifier, e.g. `cli_01h2xcejqtf2nbrexx3vqjhp41`.
pub fn generate_id(prefix: &str, random_length: usize) -> Result<String, IdError> {
    if random_length < 6 {
        return Err(IdError::TooShort);
    }
    if random_length > 16 {
        return Err(IdError::TooLong);
    }

    let raw = Ulid::new().to_string().to_lowercase();
    let timestamp_part = &raw[..10];
    let random_part = &raw[raw.len() - random_length..];

    Ok(format!("{prefix}_{timestamp_part}{random_part}"))
}
