//! Run-to-completion processing of one unit of work.

use super::listener::MachineListener;
use crate::core::{Domain, Event, StateHistory, StateTransition};
use crate::effects::Effect;
use crate::region::{HookCtx, Outbox, Region, TransitionResult, Workspace};
use crate::timer::{TimerHandle, TimerService};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Direct mutation of the field table, outside the transition tables.
pub(crate) type Command<D> = Box<dyn FnOnce(&mut <D as Domain>::Fields) + Send>;

/// An item in the dispatcher queue.
pub(crate) enum Work<D: Domain> {
    Event(D::Event),
    Timer(TimerHandle),
    Command(Command<D>),
}

/// Everything the drainer mutates.
pub(crate) struct Core<D: Domain> {
    pub(crate) regions: Vec<Region<D>>,
    pub(crate) fields: D::Fields,
    pub(crate) timers: TimerService<D>,
    pub(crate) history: StateHistory<D::State>,
}

impl<D: Domain> Core<D> {
    /// Enter the initial state of every region, in declaration order.
    pub(crate) fn start(&mut self) -> Outbox<D> {
        let mut outbox = Outbox::default();
        let Core {
            regions,
            fields,
            timers,
            ..
        } = self;
        let mut ws = Workspace {
            fields,
            timers,
            outbox: &mut outbox,
        };
        for (index, region) in regions.iter_mut().enumerate() {
            region.start(index, &mut ws);
        }
        outbox
    }

    /// Run one unit of work to completion.
    pub(crate) fn step(
        &mut self,
        work: Work<D>,
        machine: &str,
        listener: &dyn MachineListener<D>,
    ) -> Outbox<D> {
        let mut outbox = Outbox::default();
        match work {
            Work::Event(event) => self.dispatch(&event, machine, listener, &mut outbox),
            Work::Timer(handle) => self.fire(handle, machine, listener, &mut outbox),
            Work::Command(command) => command(&mut self.fields),
        }
        outbox
    }

    fn dispatch(
        &mut self,
        event: &D::Event,
        machine: &str,
        listener: &dyn MachineListener<D>,
        outbox: &mut Outbox<D>,
    ) {
        listener.on_event(machine, event);
        outbox.effects.push(Effect::ControlEventSent(event.clone()));

        let Core {
            regions,
            fields,
            timers,
            history,
        } = self;
        let mut ws = Workspace {
            fields,
            timers,
            outbox,
        };

        let mut reacted = false;
        for (index, region) in regions.iter_mut().enumerate() {
            let Some(result) = region.offer(index, event, &mut ws) else {
                continue;
            };
            reacted = true;
            if let TransitionResult::Moved { from, to } = &result {
                *history = history.record(StateTransition {
                    region: region.name().to_string(),
                    from: from.clone(),
                    to: to.clone(),
                    trigger: event.name().to_string(),
                    timestamp: Utc::now(),
                });
            }
            listener.on_transition(machine, region.name(), event, &result);
        }

        if !reacted {
            listener.on_ignored(machine, event);
        }
    }

    fn fire(
        &mut self,
        handle: TimerHandle,
        machine: &str,
        listener: &dyn MachineListener<D>,
        outbox: &mut Outbox<D>,
    ) {
        let Some((mut callback, owner)) = self.timers.take_callback(handle) else {
            listener.on_stale_timer(machine, handle);
            return;
        };

        {
            let mut ctx = HookCtx::new(
                &mut self.fields,
                &mut self.timers,
                outbox,
                owner.region,
                owner.state,
                None,
            );
            callback(&mut ctx);
        }

        self.timers.restore_callback(handle, callback);
    }

    /// Active state of every region, in declaration order.
    pub(crate) fn active_states(&self) -> Vec<D::State> {
        self.regions
            .iter()
            .map(|region| region.active_state().clone())
            .collect()
    }
}

/// Clears the drain flag on scope exit, including unwinding out of a hook.
pub(crate) struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    /// Claim the drain flag. `None` if another caller is draining.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_flag_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);

        let guard = DrainGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(DrainGuard::acquire(&flag).is_none());

        drop(guard);
        assert!(DrainGuard::acquire(&flag).is_some());
    }
}
