//! What hooks, actions and timer callbacks get to touch.

use crate::core::Domain;
use crate::effects::{DomainEffect, Effect};
use crate::timer::{owner_of, TimerHandle, TimerService};
use std::time::Duration;

/// Entry, exit and transition-action hook.
pub type Hook<D> = Box<dyn Fn(&mut HookCtx<'_, D>) + Send + Sync>;

/// Side outputs collected while one unit of work runs.
///
/// Raised events are queued behind the current unit; effects are published
/// once the unit completes.
pub(crate) struct Outbox<D: Domain> {
    pub(crate) raised: Vec<D::Event>,
    pub(crate) effects: Vec<DomainEffect<D>>,
}

impl<D: Domain> Default for Outbox<D> {
    fn default() -> Self {
        Self {
            raised: Vec::new(),
            effects: Vec::new(),
        }
    }
}

/// Mutable view handed to a hook while it runs.
///
/// A context is bound to one (region, state) activation. Timers scheduled
/// through it belong to that activation and are cancelled when the state
/// exits.
pub struct HookCtx<'a, D: Domain> {
    fields: &'a mut D::Fields,
    timers: &'a mut TimerService<D>,
    outbox: &'a mut Outbox<D>,
    region: usize,
    state: D::State,
    event: Option<&'a D::Event>,
}

impl<'a, D: Domain> HookCtx<'a, D> {
    pub(crate) fn new(
        fields: &'a mut D::Fields,
        timers: &'a mut TimerService<D>,
        outbox: &'a mut Outbox<D>,
        region: usize,
        state: D::State,
        event: Option<&'a D::Event>,
    ) -> Self {
        Self {
            fields,
            timers,
            outbox,
            region,
            state,
            event,
        }
    }

    pub fn fields(&self) -> &D::Fields {
        &*self.fields
    }

    pub fn fields_mut(&mut self) -> &mut D::Fields {
        &mut *self.fields
    }

    /// State whose activation this context belongs to.
    pub fn state(&self) -> &D::State {
        &self.state
    }

    /// Index of the region, in declaration order.
    pub fn region(&self) -> usize {
        self.region
    }

    /// Triggering event, if the hook runs on behalf of one.
    pub fn event(&self) -> Option<&D::Event> {
        self.event
    }

    /// Current machine clock.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Send an event back into the machine.
    ///
    /// It is processed after the current unit of work completes.
    pub fn raise(&mut self, event: D::Event) {
        self.outbox.raised.push(event);
    }

    /// Emit a one-shot notice to the effect consumer.
    pub fn emit(&mut self, notice: D::Notice) {
        self.outbox.effects.push(Effect::Notice(notice));
    }

    /// Fire `on_fire` once after `delay`.
    pub fn schedule_once<F>(&mut self, delay: Duration, on_fire: F) -> TimerHandle
    where
        F: FnMut(&mut HookCtx<'_, D>) + Send + 'static,
    {
        let owner = owner_of(self.region, &self.state);
        self.timers.schedule_once(owner, delay, Box::new(on_fire))
    }

    /// Fire `on_tick` every `interval`, first one interval from now.
    pub fn schedule_repeating<F>(&mut self, interval: Duration, on_tick: F) -> TimerHandle
    where
        F: FnMut(&mut HookCtx<'_, D>) + Send + 'static,
    {
        let owner = owner_of(self.region, &self.state);
        self.timers
            .schedule_repeating(owner, interval, interval, Box::new(on_tick))
    }

    /// Fire `on_tick` right away, then every `interval`.
    ///
    /// The first tick runs as its own unit of work, before the machine goes
    /// idle.
    pub fn schedule_ticker<F>(&mut self, interval: Duration, on_tick: F) -> TimerHandle
    where
        F: FnMut(&mut HookCtx<'_, D>) + Send + 'static,
    {
        let owner = owner_of(self.region, &self.state);
        self.timers
            .schedule_repeating(owner, Duration::ZERO, interval, Box::new(on_tick))
    }

    /// Cancel a timer. Cancelling twice, or after it fired, does nothing.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.cancel(handle)
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.timers.is_live(handle)
    }
}
