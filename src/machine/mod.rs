//! The running machine: parallel regions behind a serialized work queue.
//!
//! A [`Machine`] is a cheap handle. Any clone may send events from any
//! thread; the first caller to find the queue idle becomes the drainer and
//! processes work until the queue is empty. Everyone else just enqueues.
//!
//! After each unit of work the drainer rebuilds the snapshot, notifies state
//! observers if it changed, publishes effects and queues raised events.

mod dispatcher;
mod error;
mod listener;

pub use error::MachineError;
pub use listener::{MachineListener, TracingListener};

use crate::builder::MachineBuilder;
use crate::config::MachineConfig;
use crate::core::{Domain, State, StateHistory};
use crate::effects::{
    DomainEffect, EffectBus, EffectReceiver, ModelBridge, StateObservers, Subscription,
};
use crate::region::{Outbox, Region};
use crate::timer::{PendingTimer, TimerService};
use dispatcher::{Command, Core, DrainGuard, Work};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use tracing::{debug, debug_span, info};
use uuid::Uuid;

/// Resolved reference to one state of one region.
#[derive(Clone, Debug, PartialEq)]
pub struct StateRef<S> {
    region: usize,
    region_name: String,
    state: S,
}

impl<S: State> StateRef<S> {
    pub fn region(&self) -> usize {
        self.region
    }

    pub fn region_name(&self) -> &str {
        &self.region_name
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Region names and declared states, fixed at build time.
struct Topology<S> {
    regions: Vec<(String, Vec<S>)>,
}

struct Inner<D: Domain> {
    id: Uuid,
    name: String,
    core: Mutex<Core<D>>,
    queue: Mutex<VecDeque<Work<D>>>,
    draining: AtomicBool,
    shut_down: AtomicBool,
    topology: Topology<D::State>,
    active: RwLock<Arc<[D::State]>>,
    snapshot: watch::Sender<Arc<D::Model>>,
    observers: Arc<StateObservers<D::Model>>,
    effects: Arc<EffectBus<DomainEffect<D>>>,
    listener: Box<dyn MachineListener<D>>,
    wake: Notify,
    // instant the machine clock read zero at, while a driver runs
    wall_clock: RwLock<Option<Instant>>,
}

/// Handle to a running parallel-region machine.
pub struct Machine<D: Domain> {
    inner: Arc<Inner<D>>,
}

impl<D: Domain> Clone for Machine<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Domain> Machine<D> {
    /// Start describing a machine.
    pub fn builder(name: impl Into<String>, fields: D::Fields) -> MachineBuilder<D> {
        MachineBuilder::new(name, fields)
    }

    /// Assemble a machine from validated parts and enter every initial state.
    pub(crate) fn start(
        name: String,
        fields: D::Fields,
        regions: Vec<Region<D>>,
        listener: Box<dyn MachineListener<D>>,
        config: &MachineConfig,
    ) -> Self {
        let topology = Topology {
            regions: regions
                .iter()
                .map(|region| (region.name().to_string(), region.states().cloned().collect()))
                .collect(),
        };

        let mut core = Core {
            regions,
            fields,
            timers: TimerService::new(),
            history: StateHistory::with_capacity(config.history_capacity),
        };
        let outbox = core.start();
        let active: Arc<[D::State]> = core.active_states().into();
        let model = Arc::new(D::model(&core.fields, &active));
        let (snapshot, _) = watch::channel(model);

        let machine = Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                name,
                core: Mutex::new(core),
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                shut_down: AtomicBool::new(false),
                topology,
                active: RwLock::new(active),
                snapshot,
                observers: Arc::new(StateObservers::new()),
                effects: Arc::new(EffectBus::new(config.effect_buffer, config.undelivered)),
                listener,
                wake: Notify::new(),
                wall_clock: RwLock::new(None),
            }),
        };
        info!(
            machine = %machine.inner.name,
            id = %machine.inner.id,
            regions = machine.inner.topology.regions.len(),
            "machine started"
        );

        machine.finish(outbox);
        machine.drain();
        machine
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Deliver an event to every region.
    ///
    /// If another unit of work is in progress, on this thread (a hook) or
    /// another, the event is queued behind it and this call returns at once.
    pub fn process_event(&self, event: D::Event) -> Result<(), MachineError> {
        self.sync_wall_clock()?;
        self.submit(Work::Event(event))
    }

    /// Mutate the field table as a unit of work of its own.
    ///
    /// No transition fires and no hook runs; the snapshot is rebuilt
    /// afterwards like for any other unit.
    pub fn command<F>(&self, command: F) -> Result<(), MachineError>
    where
        F: FnOnce(&mut D::Fields) + Send + 'static,
    {
        let command: Command<D> = Box::new(command);
        self.sync_wall_clock()?;
        self.submit(Work::Command(command))
    }

    /// Bring the clock up to wall time before external work, firing what
    /// came due in between. Only while a driver is attached.
    fn sync_wall_clock(&self) -> Result<(), MachineError> {
        let Some(origin) = *self.inner.wall_clock.read() else {
            return Ok(());
        };
        // An active drainer, possibly this thread inside a hook, owns the
        // clock; the event just queues behind it.
        if self.inner.draining.load(Ordering::Acquire) {
            return Ok(());
        }
        self.advance_to(origin.elapsed())
    }

    /// Tie the clock to wall time. Returns the instant the clock read zero.
    pub(crate) fn attach_wall_clock(&self) -> Instant {
        let origin = Instant::now()
            .checked_sub(self.now())
            .unwrap_or_else(Instant::now);
        *self.inner.wall_clock.write() = Some(origin);
        origin
    }

    pub(crate) fn detach_wall_clock(&self) {
        *self.inner.wall_clock.write() = None;
    }

    fn submit(&self, work: Work<D>) -> Result<(), MachineError> {
        self.ensure_running()?;
        self.inner.queue.lock().push_back(work);
        self.drain();
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), MachineError> {
        if self.is_shut_down() {
            return Err(MachineError::Shutdown {
                machine: self.inner.name.clone(),
            });
        }
        Ok(())
    }

    fn drain(&self) {
        loop {
            let Some(guard) = DrainGuard::acquire(&self.inner.draining) else {
                return;
            };
            while let Some(work) = self.next_work() {
                self.run(work);
            }
            drop(guard);

            // Work queued between the last pop and the release is ours.
            if self.inner.queue.lock().is_empty() {
                return;
            }
        }
    }

    fn next_work(&self) -> Option<Work<D>> {
        {
            let mut queue = self.inner.queue.lock();
            if self.is_shut_down() {
                queue.clear();
                return None;
            }
            if let Some(work) = queue.pop_front() {
                return Some(work);
            }
        }
        // Timers already due at the current clock, such as a ticker's
        // first tick, fire before the drainer goes idle.
        let mut core = self.inner.core.lock();
        let now = core.timers.now();
        core.timers.pop_due(now).map(Work::Timer)
    }

    fn run(&self, work: Work<D>) {
        let span = debug_span!("unit", machine = %self.inner.name);
        let _entered = span.enter();

        let outbox = {
            let mut core = self.inner.core.lock();
            let outbox = core.step(work, &self.inner.name, &*self.inner.listener);
            if self.is_shut_down() {
                core.timers.cancel_all();
            }
            outbox
        };
        self.finish(outbox);
    }

    /// Post-processing of a unit: snapshot, observers, effects, raised events.
    fn finish(&self, outbox: Outbox<D>) {
        let (active, model) = {
            let core = self.inner.core.lock();
            let active: Arc<[D::State]> = core.active_states().into();
            let model = Arc::new(D::model(&core.fields, &active));
            (active, model)
        };
        *self.inner.active.write() = active;

        let previous = self.inner.snapshot.send_replace(Arc::clone(&model));
        if *previous != *model {
            self.inner.observers.notify(&model);
        }

        let Outbox { raised, effects } = outbox;
        self.inner.effects.publish(effects);

        if !raised.is_empty() && !self.is_shut_down() {
            self.inner
                .queue
                .lock()
                .extend(raised.into_iter().map(Work::Event));
        }
        self.inner.wake.notify_one();
    }

    /// Active state of every region, in declaration order.
    ///
    /// Does not lock the machine; safe to call from hooks.
    pub fn active_states(&self) -> Vec<D::State> {
        self.inner.active.read().to_vec()
    }

    /// Whether the referenced state is its region's active state.
    pub fn is_active(&self, state: &StateRef<D::State>) -> bool {
        self.inner
            .active
            .read()
            .get(state.region)
            .is_some_and(|active| *active == state.state)
    }

    /// Look up a state by region name and state name.
    pub fn require_state(
        &self,
        region: &str,
        state: &str,
    ) -> Result<StateRef<D::State>, MachineError> {
        let (index, (region_name, states)) = self
            .inner
            .topology
            .regions
            .iter()
            .enumerate()
            .find(|(_, (name, _))| name == region)
            .ok_or_else(|| MachineError::UnknownRegion {
                machine: self.inner.name.clone(),
                region: region.to_string(),
            })?;

        let found = states
            .iter()
            .find(|candidate| candidate.name() == state)
            .ok_or_else(|| MachineError::UnknownState {
                region: region_name.clone(),
                state: state.to_string(),
            })?;

        Ok(StateRef {
            region: index,
            region_name: region_name.clone(),
            state: found.clone(),
        })
    }

    /// Region names in declaration order.
    pub fn region_names(&self) -> Vec<&str> {
        self.inner
            .topology
            .regions
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Stop the machine.
    ///
    /// Queued work is discarded and every timer is cancelled. Exit hooks do
    /// not run. Later sends fail with [`MachineError::Shutdown`].
    pub fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.queue.lock().clear();
        // From inside a hook the drainer holds the core; it cancels the
        // timers itself once the unit completes.
        if let Some(mut core) = self.inner.core.try_lock() {
            core.timers.cancel_all();
        }
        self.inner.wake.notify_one();
        info!(machine = %self.inner.name, id = %self.inner.id, "machine shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    /// Current machine clock: time since build, advanced by `advance_*`.
    ///
    /// Locks the machine; must not be called from hooks.
    pub fn now(&self) -> Duration {
        self.inner.core.lock().timers.now()
    }

    /// Advance the clock by `by`, firing every timer that comes due.
    pub fn advance_time(&self, by: Duration) -> Result<(), MachineError> {
        let target = self.now() + by;
        self.advance_to(target)
    }

    /// Advance the clock to `target`, firing due timers one at a time in
    /// deadline order. Each fire runs to completion, and everything it
    /// raises is drained, before the next timer is considered.
    ///
    /// Locks the machine; must not be called from hooks.
    pub fn advance_to(&self, target: Duration) -> Result<(), MachineError> {
        loop {
            self.ensure_running()?;
            let due = self.inner.core.lock().timers.pop_due(target);
            match due {
                Some(handle) => self.submit(Work::Timer(handle))?,
                None => break,
            }
        }
        self.inner.core.lock().timers.advance_clock(target);
        Ok(())
    }

    /// Earliest pending timer deadline. Locks the machine.
    pub fn next_deadline(&self) -> Option<Duration> {
        if self.is_shut_down() {
            return None;
        }
        self.inner.core.lock().timers.next_deadline()
    }

    /// Every live timer. Locks the machine.
    pub fn pending_timers(&self) -> Vec<PendingTimer<D::State>> {
        self.inner.core.lock().timers.pending()
    }

    /// Transitions recorded so far. Locks the machine.
    pub fn history(&self) -> StateHistory<D::State> {
        self.inner.core.lock().history.clone()
    }

    /// Async view of the snapshot.
    pub fn watch_state(&self) -> watch::Receiver<Arc<D::Model>> {
        self.inner.snapshot.subscribe()
    }

    /// Become the effect consumer as an async stream, replacing any other
    /// consumer.
    pub fn effect_stream(&self) -> EffectReceiver<DomainEffect<D>> {
        self.inner.effects.attach_channel()
    }

    /// Effects waiting for a consumer to attach.
    pub fn undelivered_effects(&self) -> usize {
        self.inner.effects.pending()
    }

    pub(crate) fn wakeup(&self) -> &Notify {
        &self.inner.wake
    }
}

impl<D: Domain> ModelBridge for Machine<D> {
    type Model = D::Model;
    type Effect = DomainEffect<D>;

    fn latest_snapshot(&self) -> Arc<D::Model> {
        Arc::clone(&self.inner.snapshot.borrow())
    }

    fn observe_state(&self, observer: Box<dyn Fn(&D::Model) + Send + Sync>) -> Subscription {
        observer(&self.latest_snapshot());
        self.inner.observers.add(Arc::from(observer))
    }

    fn observe_effect(&self, consumer: Box<dyn FnMut(DomainEffect<D>) + Send>) -> Subscription {
        debug!(machine = %self.inner.name, "effect consumer attached");
        self.inner.effects.attach_callback(consumer)
    }
}

impl<D: Domain> std::fmt::Debug for Machine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("active", &self.active_states())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
