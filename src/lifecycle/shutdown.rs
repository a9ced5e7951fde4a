//! Shutdown coordination.

use tokio::sync::broadcast;

use super::signals;

/// Fan-out shutdown trigger.
///
/// Each running server holds a receiver; `trigger` stops all of them.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. A no-op when nobody is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of servers still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve on whichever comes first: the trigger (or its sender being
/// dropped) or Ctrl+C.
pub async fn wait_for_shutdown(mut rx: broadcast::Receiver<()>) {
    tokio::select! {
        _ = rx.recv() => {}
        _ = signals::ctrl_c() => {}
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_returns_after_trigger() {
        let shutdown = Shutdown::new();
        let waiter = tokio::spawn(wait_for_shutdown(shutdown.subscribe()));
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_for_shutdown should return")
            .unwrap();
    }
}
