pub mod admin;
pub mod authorizer;
pub mod store;
pub mod subscriber;
pub mod token_bucket;
pub mod token_issuer;

pub use admin::AdminService;
pub use authorizer::{Authorizer, BasicVerification};
pub use store::{NewApiScope, RateLimitConfig, Store};
pub use subscriber::run_eviction_subscriber;
pub use token_bucket::{BucketRegistry, TokenBucket};
pub use token_issuer::{IssuedToken, TokenIssuer};
