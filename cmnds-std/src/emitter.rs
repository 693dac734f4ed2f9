//! Observability events.
//!
//! Every [`Registry`](crate::Registry) and [`Channel`](crate::Channel) owns an
//! [`Emitter`]. Listeners are plain synchronous closures; they run on the
//! task that triggered the event, after the owner has released its locks, so
//! a listener may call back into the registry that notified it.

use crate::sync::lock;
use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

/// Identifies one subscription, for [`Emitter::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<Ev> = Arc<dyn Fn(&Ev) + Send + Sync>;

/// A list of listeners for events of type `Ev`.
pub struct Emitter<Ev> {
    listeners: Mutex<Vec<(SubscriptionId, Listener<Ev>)>>,
    next_id: AtomicU64,
}

impl<Ev> Emitter<Ev> {
    /// Creates an emitter without listeners.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Adds a listener. Listeners run in subscription order.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Ev) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Removes every listener.
    pub fn clear(&self) {
        lock(&self.listeners).clear();
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Returns `true` if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `event` to every listener.
    pub fn emit(&self, event: &Ev) {
        for listener in self.snapshot() {
            listener(event);
        }
    }

    /// Builds the event only if somebody is listening, then delivers it.
    pub fn emit_with(&self, make: impl FnOnce() -> Ev) {
        let listeners = self.snapshot();
        if listeners.is_empty() {
            return;
        }
        let event = make();
        for listener in listeners {
            listener(&event);
        }
    }

    fn snapshot(&self) -> Vec<Listener<Ev>> {
        lock(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

impl<Ev> Default for Emitter<Ev> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ev> fmt::Debug for Emitter<Ev> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::<u32>::new();

        let first = seen.clone();
        emitter.subscribe(move |n| first.lock().unwrap().push(("first", *n)));
        let second = seen.clone();
        emitter.subscribe(move |n| second.lock().unwrap().push(("second", *n)));

        emitter.emit(&7);
        assert_eq!(*seen.lock().unwrap(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn unsubscribe_and_clear() {
        let emitter = Emitter::<()>::new();
        let id = emitter.subscribe(|_| {});
        emitter.subscribe(|_| {});
        assert_eq!(emitter.len(), 2);

        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));
        assert_eq!(emitter.len(), 1);

        emitter.clear();
        assert!(emitter.is_empty());
    }

    #[test]
    fn emit_with_skips_building_without_listeners() {
        let emitter = Emitter::<String>::new();
        emitter.emit_with(|| panic!("event built without listeners"));
    }

    #[test]
    fn listener_may_subscribe_while_notified() {
        let emitter = Arc::new(Emitter::<()>::new());
        let inner = emitter.clone();
        emitter.subscribe(move |_| {
            inner.subscribe(|_| {});
        });
        emitter.emit(&());
        assert_eq!(emitter.len(), 2);
    }
}
