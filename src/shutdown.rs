use std::time::Duration;

use tokio::sync::watch;

/// Trigger side of the shutdown pair. Held by the orchestrator; tripped
/// once, on operator interrupt.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

/// Observer side of the shutdown pair, cloned into every lane, poll loop,
/// and stream consumer. Checked at each suspension point so no loop in the
/// harness outlives the operator's interrupt.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownHandle, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownToken { rx })
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl ShutdownToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been triggered. If the handle is dropped
    /// without triggering, shutdown can no longer happen and this future
    /// parks forever.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `duration`, waking early on shutdown. Returns true when
    /// the sleep was interrupted by cancellation.
    pub async fn cancelled_within(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = self.cancelled() => true,
        }
    }
}
