//! Cooperative cancellation
//!
//! Wraps the `watch` channel fired by the signal handler in `main`. Jobs race every
//! wait and remote call against [`ShutdownSignal::triggered`] so they stop promptly.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// A wait was cut short by shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
    // Held by `never()` so the channel stays open
    _tx: Option<Arc<watch::Sender<bool>>>,
}

impl ShutdownSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx, _tx: None }
    }

    /// A signal that never fires
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _tx: Some(Arc::new(tx)),
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested; pends forever if the sender is gone
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|stop| *stop).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep unless shutdown arrives first
    pub async fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.guard(tokio::time::sleep(duration)).await
    }

    /// Run `future` unless shutdown arrives first
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, Interrupted> {
        if self.is_triggered() {
            return Err(Interrupted);
        }
        tokio::select! {
            biased;
            _ = self.triggered() => Err(Interrupted),
            output = future => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_never_does_not_interrupt() {
        let signal = ShutdownSignal::never();
        assert!(!signal.is_triggered());
        assert_eq!(signal.sleep(Duration::from_millis(5)).await, Ok(()));
        assert_eq!(signal.guard(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_trigger_interrupts_sleep() {
        let (tx, rx) = watch::channel(false);
        let signal = ShutdownSignal::new(rx);

        let sleeper = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.sleep(Duration::from_secs(60)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), sleeper)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Err(Interrupted));
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_already_triggered_skips_future() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let signal = ShutdownSignal::new(rx);
        assert_eq!(signal.guard(async { 1 }).await, Err(Interrupted));
    }

    #[tokio::test]
    async fn test_dropped_sender_never_fires() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let signal = ShutdownSignal::new(rx);
        assert_eq!(signal.sleep(Duration::from_millis(5)).await, Ok(()));
    }
}
