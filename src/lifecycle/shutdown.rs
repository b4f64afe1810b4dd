//! Shutdown coordination for the proxy.

use std::time::Duration;

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Wraps the serve handle so signal handling can stop accepts and drain
/// in-flight connections, plus a `finished` signal observed by `Run`.
pub struct Shutdown {
    handle: axum_server::Handle,
    finished_tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (finished_tx, _) = watch::channel(false);
        Self {
            handle: axum_server::Handle::new(),
            finished_tx,
        }
    }

    /// The handle the server serves under.
    pub fn server_handle(&self) -> axum_server::Handle {
        self.handle.clone()
    }

    /// Stop accepting, drain in-flight connections for up to `grace`, then
    /// force-close whatever remains.
    pub fn begin(&self, grace: Duration) {
        tracing::info!(grace = ?grace, "Server is shutting down");
        self.handle.graceful_shutdown(Some(grace));

        let handle = self.handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let remaining = handle.connection_count();
            if remaining > 0 {
                tracing::error!(
                    connections = remaining,
                    "Graceful shutdown overran its grace period, forcing close"
                );
            }
        });
    }

    /// Mark the serve loop as returned.
    pub fn mark_finished(&self) {
        let _ = self.finished_tx.send(true);
    }

    /// Wait until the serve loop has returned.
    pub async fn finished(&self) {
        let mut rx = self.finished_tx.subscribe();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
