//! Quiet-period debouncing for rapidly changing values.
//!
//! A [`Debouncer`] owns at most one pending timer. Every [`Debouncer::push`]
//! aborts the pending timer and starts a new one for the latest value; only a
//! value that survives the full delay reaches subscribers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Debounces a stream of values of type `T`.
///
/// The settled value is published on a `watch` channel. Subscribers are only
/// notified when the settled value actually changes.
///
/// Dropping the debouncer aborts any pending timer, so nothing is published
/// after the owner has gone away.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    settled: Arc<watch::Sender<T>>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a debouncer whose settled value starts at `initial`.
    #[must_use]
    pub fn new(initial: T, delay: Duration) -> Self {
        let (settled, _) = watch::channel(initial);
        Self {
            delay,
            settled: Arc::new(settled),
            pending: None,
        }
    }

    /// The configured quiet period.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Subscribe to settled values.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.subscribe()
    }

    /// The most recently settled value.
    #[must_use]
    pub fn settled(&self) -> T {
        self.settled.borrow().clone()
    }

    /// Whether a value is waiting out its quiet period.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Offer a new value, restarting the quiet period.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn push(&mut self, value: T) {
        self.cancel();

        let settled = Arc::clone(&self.settled);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            settled.send_if_modified(|current| {
                if *current == value {
                    false
                } else {
                    *current = value;
                    true
                }
            });
        }));
    }

    /// Abort the pending timer, if any, without publishing its value.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_only_final_value_is_emitted() {
        let mut debouncer = Debouncer::new(String::new(), DELAY);
        let mut rx = debouncer.subscribe();

        for term in ["p", "ph", "pho", "phon", "phone"] {
            debouncer.push(term.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(!rx.has_changed().unwrap_or(false));
        assert_eq!(debouncer.settled(), "");

        tokio::time::sleep(DELAY).await;
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(*rx.borrow_and_update(), "phone");

        // Exactly once: nothing further arrives.
        tokio::time::sleep(DELAY * 4).await;
        assert!(!rx.has_changed().unwrap_or(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_emitted_before_delay() {
        let mut debouncer = Debouncer::new(0_u32, DELAY);
        let rx = debouncer.subscribe();

        debouncer.push(7);
        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert_eq!(*rx.borrow(), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(*rx.borrow(), 7);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_restarts_timer() {
        let mut debouncer = Debouncer::new(0_u32, DELAY);
        let rx = debouncer.subscribe();

        debouncer.push(1);
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.push(2);
        tokio::time::sleep(Duration::from_millis(400)).await;

        // 800ms after the first push, but only 400ms after the second.
        assert_eq!(*rx.borrow(), 0);

        tokio::time::sleep(Duration::from_millis(101)).await;
        assert_eq!(*rx.borrow(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_value_does_not_notify() {
        let mut debouncer = Debouncer::new("lamp".to_string(), DELAY);
        let mut rx = debouncer.subscribe();

        debouncer.push("lamps".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push("lamp".to_string());
        tokio::time::sleep(DELAY * 2).await;

        assert!(!rx.has_changed().unwrap_or(true));
        assert_eq!(*rx.borrow_and_update(), "lamp");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_value() {
        let mut debouncer = Debouncer::new(0_u32, DELAY);
        let rx = debouncer.subscribe();

        debouncer.push(5);
        debouncer.cancel();
        tokio::time::sleep(DELAY * 2).await;

        assert_eq!(*rx.borrow(), 0);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_timer() {
        let mut debouncer = Debouncer::new(0_u32, DELAY);
        let rx = debouncer.subscribe();

        debouncer.push(9);
        drop(debouncer);
        tokio::time::sleep(DELAY * 2).await;

        // Sender is gone and the value never settled.
        assert_eq!(*rx.borrow(), 0);
    }
}
