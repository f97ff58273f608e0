//! Platform-level cross-cutting concerns: graceful shutdown. Multi-process
//! port-leasing (`PortAuthority`/`PortLease`/`safe_socket`) has no
//! counterpart in this service, see DESIGN.md.

pub mod shutdown;

pub use shutdown::{cancel_subscriber, shutdown_signal, GracefulShutdown};
