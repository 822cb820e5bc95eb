//! "Event or bounded timeout, whichever comes first."

use std::future::Future;
use std::time::Duration;

/// Outcome of [`first_of`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Raced<T> {
    /// The event settled first.
    Event(T),
    /// The limit elapsed first.
    TimedOut,
}

impl<T> Raced<T> {
    pub fn timed_out(&self) -> bool {
        matches!(self, Raced::TimedOut)
    }

    /// Event output, if the event won.
    pub fn into_event(self) -> Option<T> {
        match self {
            Raced::Event(value) => Some(value),
            Raced::TimedOut => None,
        }
    }
}

/// Waits for `event`, giving up after `limit`.
pub async fn first_of<F: Future>(event: F, limit: Duration) -> Raced<F::Output> {
    match tokio::time::timeout(limit, event).await {
        Ok(value) => Raced::Event(value),
        Err(_) => Raced::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Instant};

    #[tokio::test(start_paused = true)]
    async fn test_event_wins() {
        let outcome = first_of(async { 7 }, Duration::from_millis(500)).await;
        assert_eq!(outcome, Raced::Event(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_wins() {
        let start = Instant::now();
        let outcome = first_of(sleep(Duration::from_secs(10)), Duration::from_millis(500)).await;
        assert!(outcome.timed_out());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_firing_event_is_bounded() {
        let outcome = first_of(std::future::pending::<()>(), Duration::from_millis(500)).await;
        assert_eq!(outcome.into_event(), None);
    }
}
