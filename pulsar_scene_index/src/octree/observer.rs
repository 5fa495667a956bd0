/// Publish notifications for index generations.
///
/// A minimal observer contract decoupled from any UI thread model: the
/// manager fires `on_index_published` once per completed rebuild, after
/// the new snapshot is reachable through `current()`, never before. The
/// notification carries only the generation id — consumers fetch the
/// snapshot themselves so the notifier never hands out a structure that
/// outlives its owner.

use std::sync::{Arc, Weak};

/// Observer contract for index publications.
///
/// Implementations must be thread-safe; the callback runs on whatever
/// context drains the rebuild.
pub trait IndexObserver: Send + Sync {
    /// Called once per completed rebuild with the new generation id.
    fn on_index_published(&self, generation: u64);
}

/// Subscription list holding weak references.
///
/// Observers are retained weakly: dropping the subscriber's `Arc` is the
/// unsubscribe, and dead entries are pruned on the next notification.
pub struct ChangeNotifier {
    observers: Vec<Weak<dyn IndexObserver>>,
}

impl ChangeNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Subscribe an observer. Only a weak reference is kept.
    pub fn subscribe<O: IndexObserver + 'static>(&mut self, observer: &Arc<O>) {
        let observer: Arc<dyn IndexObserver> = observer.clone();
        let weak: Weak<dyn IndexObserver> = Arc::downgrade(&observer);
        self.observers.push(weak);
    }

    /// Number of currently live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.observers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Notify all live observers of a published generation, pruning
    /// entries whose subscriber has been dropped.
    pub fn notify(&mut self, generation: u64) {
        self.observers.retain(|weak| match weak.upgrade() {
            Some(observer) => {
                observer.on_index_published(generation);
                true
            }
            None => false,
        });
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
