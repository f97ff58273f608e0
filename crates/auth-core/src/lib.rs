//! Core domain logic for the OAuth2 client-credentials authorization
//! service: entities, the error taxonomy, and the services built on top of
//! the storage and pub/sub contracts (`services::store::Store`,
//! `auth_cache::Publisher`).

pub mod error;
pub mod models;
pub mod services;
