pub mod admin_apis;
pub mod admin_clients;
pub mod admin_internal;
pub mod health;
pub mod token;
pub mod tokens;
