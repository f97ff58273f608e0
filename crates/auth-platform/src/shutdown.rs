//! Graceful shutdown: wait for SIGTERM/SIGINT, let the in-flight request
//! set drain, then let the caller cancel whatever background tasks it
//! started (here: the pub/sub subscriber).

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Resolves on SIGTERM or SIGINT (Ctrl+C). `axum::serve`'s
/// `with_graceful_shutdown` awaits this directly.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
        info!("received ctrl-c");
    }
}

/// Cancels the long-lived pub/sub subscriber task once the server has
/// stopped accepting new connections. A missed or in-flight message is
/// dropped — pub/sub is advisory, so this never blocks shutdown waiting
/// for a clean drain of the channel itself.
pub fn cancel_subscriber(handle: &JoinHandle<()>) {
    handle.abort();
}

pub struct GracefulShutdown {
    drain_timeout: Duration,
}

impl GracefulShutdown {
    pub fn new(drain_timeout: Duration) -> Self {
        Self { drain_timeout }
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
