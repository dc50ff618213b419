//! Cooperative cancellation signal.
//!
//! The executor's cancel signal (propagated to every in-flight task at
//! every suspension point: throttle wait, HTTP send, checkpoint write,
//! authentication lock) is a broadcast-style watch channel rather than a
//! `CancellationToken` type so that cloning a receiver is cheap and
//! `cancelled()` can be awaited from a `tokio::select!` alongside other
//! suspension points.

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct ShutdownSender(watch::Sender<bool>);

#[derive(Debug, Clone)]
pub struct ShutdownReceiver(watch::Receiver<bool>);

pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender(tx), ShutdownReceiver(rx))
}

impl ShutdownSender {
    /// Request cancellation. Idempotent: calling this more than once is a
    /// no-op after the first call.
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

impl ShutdownReceiver {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation has been requested. Safe to race against
    /// other futures in a `tokio::select!` at any suspension point.
    pub async fn cancelled(&mut self) {
        if self.is_cancelled() {
            return;
        }
        while self.0.changed().await.is_ok() {
            if self.is_cancelled() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let (tx, mut rx) = shutdown_channel();
        assert!(!rx.is_cancelled());
        let waiter = tokio::spawn(async move {
            rx.cancelled().await;
            rx.is_cancelled()
        });
        tx.cancel();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn already_cancelled_returns_immediately() {
        let (tx, mut rx) = shutdown_channel();
        tx.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(50), rx.cancelled())
            .await
            .expect("cancelled() must not block once already cancelled");
    }
}
