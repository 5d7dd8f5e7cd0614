//! Outward boundary: snapshots, state observers and the effect consumer.

use super::bus::Subscription;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// State observer callback.
pub type StateObserver<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// What a presentation layer binds to.
///
/// Snapshots are immutable and replaced wholesale. State observers are
/// multi-cast; the effect consumer is single.
pub trait ModelBridge: Send + Sync {
    type Model;
    type Effect;

    /// Most recent snapshot.
    fn latest_snapshot(&self) -> Arc<Self::Model>;

    /// Observe snapshot changes. The observer is called with the current
    /// snapshot right away.
    fn observe_state(&self, observer: Box<dyn Fn(&Self::Model) + Send + Sync>) -> Subscription;

    /// Become the effect consumer, replacing any previous one.
    fn observe_effect(&self, consumer: Box<dyn FnMut(Self::Effect) + Send>) -> Subscription;
}

/// Registered state observers.
pub(crate) struct StateObservers<M> {
    inner: Mutex<ObserverList<M>>,
}

struct ObserverList<M> {
    next: u64,
    observers: Vec<(u64, StateObserver<M>)>,
}

impl<M: Send + Sync + 'static> StateObservers<M> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(ObserverList {
                next: 0,
                observers: Vec::new(),
            }),
        }
    }

    pub(crate) fn add(self: &Arc<Self>, observer: StateObserver<M>) -> Subscription {
        let id = {
            let mut list = self.inner.lock();
            let id = list.next;
            list.next += 1;
            list.observers.push((id, observer));
            id
        };

        let observers: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(observers) = observers.upgrade() {
                observers.inner.lock().observers.retain(|(other, _)| *other != id);
            }
        })
    }

    /// Call every observer. Observers run without the list locked, so they
    /// may subscribe or unsubscribe.
    pub(crate) fn notify(&self, model: &M) {
        let observers: Vec<StateObserver<M>> = self
            .inner
            .lock()
            .observers
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(model);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observers_are_multicast_until_dropped() {
        let observers = Arc::new(StateObservers::<u32>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = {
            let seen = Arc::clone(&seen);
            observers.add(Arc::new(move |n: &u32| seen.lock().push(("a", *n))))
        };
        let _b = {
            let seen = Arc::clone(&seen);
            observers.add(Arc::new(move |n: &u32| seen.lock().push(("b", *n))))
        };

        observers.notify(&1);
        drop(a);
        observers.notify(&2);

        assert_eq!(*seen.lock(), vec![("a", 1), ("b", 1), ("b", 2)]);
        assert_eq!(observers.len(), 1);
    }
}
