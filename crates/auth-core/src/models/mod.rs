pub mod api;
pub mod client;
pub mod client_secret;
pub mod workspace;

pub use api::{Api, ApiScope};
pub use client::Client;
pub use client_secret::{ClientSecret, SecretStatus};
pub use workspace::Workspace;
