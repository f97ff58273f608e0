pub mod hashing;
pub mod ids;
pub mod jwt;

pub use hashing::{generate_secret_plaintext, hash_secret, verify_secret};
pub use ids::{generate_id, IdError};
pub use jwt::{JwtClaims, JwtCodec, JwtError};
