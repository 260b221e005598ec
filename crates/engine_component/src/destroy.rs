//! Destroy-notification subscriptions.
//!
//! Systems that keep per-unit data (render world, physics world, script
//! world) subscribe here so they can drop their instances when a unit dies.
//! Each subscription is keyed by a [`SubscriberId`] chosen by the subscriber;
//! one subscriber owns exactly one subscription.

use crate::entity::EntityId;

/// Opaque key identifying the owner of a destroy subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

type DestroyFn = Box<dyn FnMut(EntityId) + Send>;

struct Subscription {
    subscriber: SubscriberId,
    callback: DestroyFn,
}

/// Ordered list of destroy callbacks.
///
/// Callbacks run in registration order, except that unregistering moves the
/// last subscription into the freed slot.
#[derive(Default)]
pub struct DestroyCallbacks {
    subscriptions: Vec<Subscription>,
}

impl DestroyCallbacks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Append a subscription.
    ///
    /// Registering the same `subscriber` twice is outside the contract;
    /// [`DestroyCallbacks::unregister`] would only remove one of them.
    pub fn register<F>(&mut self, subscriber: SubscriberId, callback: F)
    where
        F: FnMut(EntityId) + Send + 'static,
    {
        debug_assert!(
            !self.contains(subscriber),
            "subscriber {subscriber:?} registered twice"
        );
        self.subscriptions.push(Subscription {
            subscriber,
            callback: Box::new(callback),
        });
    }

    /// Remove the subscription owned by `subscriber`.
    ///
    /// # Panics
    ///
    /// Panics if `subscriber` has no subscription. That is a lifecycle bug in
    /// the caller, not a recoverable condition.
    pub fn unregister(&mut self, subscriber: SubscriberId) {
        let Some(pos) = self
            .subscriptions
            .iter()
            .position(|s| s.subscriber == subscriber)
        else {
            panic!("unknown destroy function for subscriber {subscriber:?}");
        };
        self.subscriptions.swap_remove(pos);
    }

    /// Returns `true` if `subscriber` has a subscription.
    #[must_use]
    pub fn contains(&self, subscriber: SubscriberId) -> bool {
        self.subscriptions.iter().any(|s| s.subscriber == subscriber)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Invoke every callback, in order, with `id`.
    pub fn trigger(&mut self, id: EntityId) {
        for sub in &mut self.subscriptions {
            (sub.callback)(id);
        }
    }
}

impl std::fmt::Debug for DestroyCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.subscriptions.iter().map(|s| s.subscriber))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<(u64, EntityId)>>>;

    fn recorder(log: Log, tag: u64) -> impl FnMut(EntityId) + Send {
        move |id| log.lock().unwrap().push((tag, id))
    }

    #[test]
    fn test_trigger_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = DestroyCallbacks::new();
        callbacks.register(SubscriberId(10), recorder(Arc::clone(&log), 10));
        callbacks.register(SubscriberId(20), recorder(Arc::clone(&log), 20));
        callbacks.register(SubscriberId(30), recorder(Arc::clone(&log), 30));

        let id = EntityId::from_raw(7);
        callbacks.trigger(id);

        assert_eq!(*log.lock().unwrap(), vec![(10, id), (20, id), (30, id)]);
    }

    #[test]
    fn test_unregister_swaps_last_into_slot() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = DestroyCallbacks::new();
        callbacks.register(SubscriberId(1), recorder(Arc::clone(&log), 1));
        callbacks.register(SubscriberId(2), recorder(Arc::clone(&log), 2));
        callbacks.register(SubscriberId(3), recorder(Arc::clone(&log), 3));

        callbacks.unregister(SubscriberId(1));
        assert_eq!(callbacks.len(), 2);
        assert!(!callbacks.contains(SubscriberId(1)));

        callbacks.trigger(EntityId::from_raw(0));
        let tags: Vec<u64> = log.lock().unwrap().iter().map(|(t, _)| *t).collect();
        assert_eq!(tags, vec![3, 2]);
    }

    #[test]
    #[should_panic(expected = "unknown destroy function")]
    fn test_unregister_unknown_panics() {
        let mut callbacks = DestroyCallbacks::new();
        callbacks.unregister(SubscriberId(99));
    }

    #[test]
    fn test_empty_trigger_is_noop() {
        let mut callbacks = DestroyCallbacks::new();
        assert!(callbacks.is_empty());
        callbacks.trigger(EntityId::from_raw(1));
    }
}
