//! Diagnostic sink injected at build time.

use crate::core::{Domain, Event};
use crate::region::TransitionResult;
use crate::timer::TimerHandle;
use tracing::{debug, trace};

/// Receives what the dispatcher does. Every method defaults to nothing.
///
/// Listeners run on the dispatching thread while the machine is locked and
/// must not call back into the machine.
pub trait MachineListener<D: Domain>: Send + Sync {
    /// An event is about to be offered to the regions.
    fn on_event(&self, _machine: &str, _event: &D::Event) {}

    /// A region fired a transition.
    fn on_transition(
        &self,
        _machine: &str,
        _region: &str,
        _event: &D::Event,
        _result: &TransitionResult<D::State>,
    ) {
    }

    /// No region reacted to the event.
    fn on_ignored(&self, _machine: &str, _event: &D::Event) {}

    /// A timer fire arrived after its timer was cancelled.
    fn on_stale_timer(&self, _machine: &str, _handle: TimerHandle) {}
}

/// Forwards everything to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingListener;

impl<D: Domain> MachineListener<D> for TracingListener {
    fn on_event(&self, machine: &str, event: &D::Event) {
        trace!(machine, event = event.name(), "dispatching event");
    }

    fn on_transition(
        &self,
        machine: &str,
        region: &str,
        event: &D::Event,
        result: &TransitionResult<D::State>,
    ) {
        match result {
            TransitionResult::Moved { from, to } => debug!(
                machine,
                region,
                event = event.name(),
                from = ?from,
                to = ?to,
                "transition"
            ),
            TransitionResult::Internal { state } => trace!(
                machine,
                region,
                event = event.name(),
                state = ?state,
                "internal transition"
            ),
        }
    }

    fn on_ignored(&self, machine: &str, event: &D::Event) {
        debug!(machine, event = event.name(), "no region reacted to event");
    }

    fn on_stale_timer(&self, machine: &str, handle: TimerHandle) {
        debug!(
            machine,
            slot = handle.slot(),
            generation = handle.generation(),
            "discarded stale timer fire"
        );
    }
}
