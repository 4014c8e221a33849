//! Process-wide Ctrl-C handling shared by the bot and the OAuth server.

use log::{error, info};
use tokio::sync::watch;

/// Listens for Ctrl-C once for the whole process.
///
/// The listener is registered immediately, so a signal that arrives while the
/// caller is busy is still seen on its next check. If the listener cannot be
/// registered the error is logged and the sender is dropped, which leaves
/// every receiver waiting forever instead of shutting down.
pub fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, shutting down...");
                let _ = tx.send(true);
            }
            Err(e) => error!("Failed to listen for shutdown signal: {e}"),
        }
    });
    rx
}

/// Resolves once shutdown has been requested, including before this call.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        // No sender left: shutdown can never be requested.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn signal_sent_before_waiting_is_not_lost() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).expect("send");

        timeout(Duration::from_millis(100), shutdown_requested(&mut rx))
            .await
            .expect("shutdown observed");
    }

    #[tokio::test]
    async fn pending_without_signal() {
        let (_tx, mut rx) = watch::channel(false);

        let waited = timeout(Duration::from_millis(50), shutdown_requested(&mut rx)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn dropped_listener_never_requests_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        let waited = timeout(Duration::from_millis(50), shutdown_requested(&mut rx)).await;
        assert!(waited.is_err());
    }
}
