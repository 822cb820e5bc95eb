//! One-way readiness latch.
//!
//! The host page resolves it once its critical resources are loaded, or a
//! fallback timer does. Readiness is a liveness signal: a failed readiness
//! check resolves the latch exactly like a successful one.

use std::sync::Arc;
use tokio::sync::watch;

/// Single-resolution latch shared by the host page and the sequencer.
///
/// Clones observe the same latch. Once ready, it stays ready.
#[derive(Debug, Clone)]
pub struct ReadinessSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ReadinessSignal {
    /// Creates a pending latch.
    pub fn pending() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Creates a latch that is already ready (host has nothing to wait for).
    pub fn ready() -> Self {
        let signal = Self::pending();
        signal.resolve();
        signal
    }

    /// Moves the latch to ready. Returns true only for the call that
    /// actually changed it.
    pub fn resolve(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits until the latch is ready. Returns immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(feature = "runtime")]
impl ReadinessSignal {
    /// Creates a latch resolved by `check` or by `fallback`, whichever
    /// comes first. The output of `check` is ignored, so an `Err` counts
    /// as ready too.
    ///
    /// The task is detached and lives until one of the two settles. Hosts
    /// that unmount early and want it gone should build the latch with
    /// [`pending`](Self::pending) and keep the handle from
    /// [`attach`](Self::attach).
    pub fn race<F>(check: F, fallback: std::time::Duration) -> Self
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send,
    {
        let signal = Self::pending();
        signal.attach(check, fallback);
        signal
    }

    /// Spawns a task that resolves this latch when `check` settles or
    /// `fallback` elapses. Aborting the returned handle cancels both and
    /// leaves the latch as it is.
    pub fn attach<F>(&self, check: F, fallback: std::time::Duration) -> tokio::task::JoinHandle<()>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send,
    {
        let signal = self.clone();
        tokio::spawn(async move {
            let outcome = super::race::first_of(check, fallback).await;
            if outcome.timed_out() {
                tracing::debug!("readiness check timed out, forcing ready");
            }
            signal.resolve();
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================


#[cfg(all(test, feature = "runtime"))]
mod race_tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

    #[tokio::test(start_paused = true)]
    async fn test_race_resolves_on_check() {
        let start = Instant::now();
        let signal = ReadinessSignal::race(sleep(Duration::from_millis(500)), Duration::from_secs(15));
        signal.wait().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500) && elapsed < Duration::from_millis(510));
    }

    #[tokio::test(start_paused = true)]
    async fn test_race_treats_failure_as_ready() {
        let signal = ReadinessSignal::race(
            async { Err::<(), &str>("fonts failed") },
            Duration::from_secs(15),
        );
        signal.wait().await;
        assert!(signal.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_race_falls_back_when_check_hangs() {
        let start = Instant::now();
        let signal = ReadinessSignal::race(std::future::pending::<()>(), Duration::from_millis(2000));
        signal.wait().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2000) && elapsed < Duration::from_millis(2010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_attach_leaves_latch_pending() {
        let signal = ReadinessSignal::pending();
        let task = signal.attach(std::future::pending::<()>(), Duration::from_millis(2000));

        sleep(Duration::from_millis(100)).await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        sleep(Duration::from_millis(5000)).await;
        assert!(!signal.is_ready());
    }
}
