/// Tests for the ChangeNotifier publish mechanism.

use super::*;
use std::sync::Mutex;

struct Recorder {
    seen: Mutex<Vec<u64>>,
}

impl Recorder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<u64> {
        self.seen.lock().unwrap().clone()
    }
}

impl IndexObserver for Recorder {
    fn on_index_published(&self, generation: u64) {
        self.seen.lock().unwrap().push(generation);
    }
}

// ============================================================================
// Tests: subscription and notification
// ============================================================================

#[test]
fn test_notify_reaches_subscriber() {
    let mut notifier = ChangeNotifier::new();
    let recorder = Recorder::new();
    notifier.subscribe(&recorder);

    notifier.notify(1);
    notifier.notify(2);

    assert_eq!(recorder.seen(), vec![1, 2]);
}

#[test]
fn test_notify_reaches_all_subscribers() {
    let mut notifier = ChangeNotifier::new();
    let a = Recorder::new();
    let b = Recorder::new();
    notifier.subscribe(&a);
    notifier.subscribe(&b);
    assert_eq!(notifier.observer_count(), 2);

    notifier.notify(7);

    assert_eq!(a.seen(), vec![7]);
    assert_eq!(b.seen(), vec![7]);
}

#[test]
fn test_notify_with_no_subscribers_is_noop() {
    let mut notifier = ChangeNotifier::new();
    notifier.notify(1);
    assert_eq!(notifier.observer_count(), 0);
}

// ============================================================================
// Tests: weak subscriptions
// ============================================================================

#[test]
fn test_dropped_subscriber_stops_receiving() {
    let mut notifier = ChangeNotifier::new();
    let kept = Recorder::new();
    let dropped = Recorder::new();
    notifier.subscribe(&kept);
    notifier.subscribe(&dropped);

    drop(dropped);
    assert_eq!(notifier.observer_count(), 1);

    notifier.notify(3);
    assert_eq!(kept.seen(), vec![3]);
}

#[test]
fn test_dead_entries_are_pruned_on_notify() {
    let mut notifier = ChangeNotifier::new();
    for _ in 0..10 {
        let transient = Recorder::new();
        notifier.subscribe(&transient);
        // Dropped immediately
    }
    assert_eq!(notifier.observer_count(), 0);

    notifier.notify(1);
    // Internal list compacted
    assert_eq!(notifier.observers.len(), 0);
}

#[test]
fn test_subscription_does_not_extend_lifetime() {
    let mut notifier = ChangeNotifier::new();
    let recorder = Recorder::new();
    let weak = Arc::downgrade(&recorder);
    notifier.subscribe(&recorder);

    drop(recorder);
    // The notifier's weak reference must not keep the observer alive
    assert!(weak.upgrade().is_none());
}
