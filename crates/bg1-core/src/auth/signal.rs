//! Unauthorized notification channel.
//!
//! Publishers (credential stores, the API client) hold a clone of the signal
//! and call `notify`; they never see who is listening.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct UnauthorizedSignal {
    handlers: Arc<RwLock<Vec<UnauthorizedHandler>>>,
}

impl UnauthorizedSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: UnauthorizedHandler) {
        self.handlers.write().push(handler);
    }

    /// Invoke every subscriber in registration order.
    ///
    /// The handler list is snapshotted first so a handler may subscribe
    /// without deadlocking.
    pub fn notify(&self) {
        let handlers: Vec<UnauthorizedHandler> = self.handlers.read().clone();
        debug!(subscribers = handlers.len(), "Publishing unauthorized signal");
        for handler in handlers {
            handler();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl fmt::Debug for UnauthorizedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnauthorizedSignal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_notify_reaches_every_subscriber() {
        let signal = UnauthorizedSignal::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let hits = Arc::clone(&hits);
            signal.subscribe(Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        signal.notify();
        signal.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let signal = UnauthorizedSignal::new();
        let publisher = signal.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        signal.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        publisher.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.subscriber_count(), 1);
    }

    #[test]
    fn test_notify_without_subscribers_ok() {
        UnauthorizedSignal::new().notify();
    }

    #[test]
    fn test_handler_may_subscribe_during_notify() {
        let signal = UnauthorizedSignal::new();
        let inner = signal.clone();
        signal.subscribe(Arc::new(move || {
            inner.subscribe(Arc::new(|| {}));
        }));

        signal.notify();
        assert_eq!(signal.subscriber_count(), 2);
    }
}
