//! Configuration management system
//!
//! Layered config loading (defaults, env, local overrides) with validation.

pub mod config;
pub mod loader;
pub mod validation;

pub use config::*;
pub use loader::*;
pub use validation::*;