pub mod client_cache;
pub mod pubsub;

pub use client_cache::ClientCache;
pub use pubsub::{Envelope, InMemoryPubSub, Publisher, RedisPubSub, Subscription};
