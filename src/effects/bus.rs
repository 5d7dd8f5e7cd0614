//! Single-consumer delivery of one-shot effects.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default bound on effects held while no consumer is attached.
pub const DEFAULT_EFFECT_BUFFER: usize = 64;

/// What happens to an effect published while no consumer is attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndeliveredEffects {
    /// Hold it (bounded) and deliver it to the next consumer that attaches.
    #[default]
    Buffer,
    /// Discard it.
    Drop,
}

/// Detaches an observer or consumer when dropped.
#[must_use = "dropping a Subscription detaches it immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach now.
    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

type Callback<T> = Box<dyn FnMut(T) + Send>;

enum Consumer<T> {
    Detached,
    Callback { token: u64, callback: Callback<T> },
    // callback taken out while it runs
    Delivering { token: u64 },
    Channel {
        token: u64,
        tx: mpsc::UnboundedSender<T>,
    },
}

impl<T> Consumer<T> {
    fn token(&self) -> Option<u64> {
        match self {
            Consumer::Detached => None,
            Consumer::Callback { token, .. }
            | Consumer::Delivering { token }
            | Consumer::Channel { token, .. } => Some(*token),
        }
    }
}

struct BusState<T> {
    consumer: Consumer<T>,
    pending: VecDeque<T>,
}

/// One-shot notification channel with at most one consumer.
///
/// Attaching a consumer replaces the previous one. Every published effect
/// reaches at most one consumer.
pub(crate) struct EffectBus<T> {
    state: Mutex<BusState<T>>,
    tokens: AtomicU64,
    capacity: usize,
    policy: UndeliveredEffects,
}

impl<T: Send + 'static> EffectBus<T> {
    pub(crate) fn new(capacity: usize, policy: UndeliveredEffects) -> Self {
        Self {
            state: Mutex::new(BusState {
                consumer: Consumer::Detached,
                pending: VecDeque::new(),
            }),
            tokens: AtomicU64::new(1),
            capacity,
            policy,
        }
    }

    pub(crate) fn publish(&self, effects: impl IntoIterator<Item = T>) {
        for effect in effects {
            if let Err(effect) = self.deliver(effect) {
                self.hold(effect);
            }
        }
    }

    /// Number of effects waiting for a consumer.
    pub(crate) fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub(crate) fn attach_callback(self: &Arc<Self>, callback: Callback<T>) -> Subscription {
        let token = self.next_token();
        self.replace(Consumer::Callback { token, callback });
        self.flush();
        self.subscription(token)
    }

    pub(crate) fn attach_channel(self: &Arc<Self>) -> EffectReceiver<T> {
        let token = self.next_token();
        let (tx, rx) = mpsc::unbounded_channel();
        self.replace(Consumer::Channel { token, tx });
        self.flush();
        EffectReceiver {
            rx,
            _subscription: self.subscription(token),
        }
    }

    fn next_token(&self) -> u64 {
        self.tokens.fetch_add(1, Ordering::Relaxed)
    }

    fn replace(&self, consumer: Consumer<T>) {
        let mut state = self.state.lock();
        if state.consumer.token().is_some() {
            debug!("effect consumer replaced");
        }
        state.consumer = consumer;
    }

    fn subscription(self: &Arc<Self>, token: u64) -> Subscription {
        let bus: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(bus) = bus.upgrade() {
                bus.detach(token);
            }
        })
    }

    fn detach(&self, token: u64) {
        let mut state = self.state.lock();
        if state.consumer.token() == Some(token) {
            state.consumer = Consumer::Detached;
        }
    }

    /// Hand one effect to the current consumer, or give it back.
    fn deliver(&self, effect: T) -> Result<(), T> {
        let mut state = self.state.lock();
        let (token, mut callback) =
            match std::mem::replace(&mut state.consumer, Consumer::Detached) {
                Consumer::Callback { token, callback } => {
                    state.consumer = Consumer::Delivering { token };
                    (token, callback)
                }
                Consumer::Channel { token, tx } => {
                    return match tx.send(effect) {
                        Ok(()) => {
                            state.consumer = Consumer::Channel { token, tx };
                            Ok(())
                        }
                        Err(mpsc::error::SendError(effect)) => Err(effect),
                    };
                }
                other => {
                    state.consumer = other;
                    return Err(effect);
                }
            };
        drop(state);

        callback(effect);

        let mut state = self.state.lock();
        if matches!(state.consumer, Consumer::Delivering { token: current } if current == token) {
            state.consumer = Consumer::Callback { token, callback };
        }
        Ok(())
    }

    fn hold(&self, effect: T) {
        if self.policy == UndeliveredEffects::Drop || self.capacity == 0 {
            debug!("no effect consumer attached, effect dropped");
            return;
        }
        let mut state = self.state.lock();
        if state.pending.len() >= self.capacity {
            state.pending.pop_front();
            warn!(
                capacity = self.capacity,
                "effect buffer full, oldest effect dropped"
            );
        }
        state.pending.push_back(effect);
    }

    fn flush(&self) {
        loop {
            let Some(effect) = self.state.lock().pending.pop_front() else {
                return;
            };
            if let Err(effect) = self.deliver(effect) {
                self.state.lock().pending.push_front(effect);
                return;
            }
        }
    }
}

/// Async single consumer of a machine's effects.
///
/// Attaching one replaces any other consumer; dropping it detaches.
pub struct EffectReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
    _subscription: Subscription,
}

impl<T> EffectReceiver<T> {
    /// Wait for the next effect. Returns `None` once this receiver was
    /// replaced by another consumer and everything sent to it was read.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next effect if one is ready.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> std::fmt::Debug for EffectReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectReceiver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(bus: &Arc<EffectBus<u32>>) -> (Arc<Mutex<Vec<u32>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = bus.attach_callback(Box::new(move |n: u32| sink.lock().push(n)));
        (seen, subscription)
    }

    #[test]
    fn attached_callback_receives_in_order() {
        let bus = Arc::new(EffectBus::new(8, UndeliveredEffects::Buffer));
        let (seen, _subscription) = collector(&bus);

        bus.publish([1, 2, 3]);

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn buffered_until_attach() {
        let bus = Arc::new(EffectBus::new(8, UndeliveredEffects::Buffer));
        bus.publish([1, 2]);
        assert_eq!(bus.pending(), 2);

        let (seen, _subscription) = collector(&bus);

        assert_eq!(*seen.lock(), vec![1, 2]);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let bus = Arc::new(EffectBus::new(2, UndeliveredEffects::Buffer));
        bus.publish([1, 2, 3]);

        let (seen, _subscription) = collector(&bus);

        assert_eq!(*seen.lock(), vec![2, 3]);
    }

    #[test]
    fn drop_policy_discards_unobserved() {
        let bus = Arc::new(EffectBus::new(8, UndeliveredEffects::Drop));
        bus.publish([1]);

        let (seen, _subscription) = collector(&bus);
        bus.publish([2]);

        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn new_consumer_replaces_old() {
        let bus = Arc::new(EffectBus::new(8, UndeliveredEffects::Buffer));
        let (first, _first_sub) = collector(&bus);
        let (second, _second_sub) = collector(&bus);

        bus.publish([7]);

        assert!(first.lock().is_empty());
        assert_eq!(*second.lock(), vec![7]);
    }

    #[test]
    fn stale_subscription_does_not_detach_replacement() {
        let bus = Arc::new(EffectBus::new(8, UndeliveredEffects::Buffer));
        let (_first, first_sub) = collector(&bus);
        let (second, _second_sub) = collector(&bus);

        drop(first_sub);
        bus.publish([9]);

        assert_eq!(*second.lock(), vec![9]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = Arc::new(EffectBus::new(8, UndeliveredEffects::Buffer));
        let (seen, subscription) = collector(&bus);

        subscription.unsubscribe();
        bus.publish([4]);

        assert!(seen.lock().is_empty());
        assert_eq!(bus.pending(), 1);
    }

    #[tokio::test]
    async fn channel_consumer_receives_buffered_and_live() {
        let bus = Arc::new(EffectBus::new(8, UndeliveredEffects::Buffer));
        bus.publish([1]);

        let mut receiver = bus.attach_channel();
        bus.publish([2]);

        assert_eq!(receiver.recv().await, Some(1));
        assert_eq!(receiver.recv().await, Some(2));
    }

    #[test]
    fn dropped_receiver_detaches() {
        let bus = Arc::new(EffectBus::new(8, UndeliveredEffects::Buffer));
        let receiver = bus.attach_channel();
        drop(receiver);

        bus.publish([5]);

        assert_eq!(bus.pending(), 1);
    }
}
