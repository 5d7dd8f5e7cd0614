//! Region reaction: transition lookup, guard evaluation, target resolution
//! and the exit → action → entry sequence.

use super::context::{HookCtx, Outbox};
use super::node::StateNode;
use super::transition::{Transition, TransitionResult};
use crate::core::{Domain, Event};
use crate::effects::Effect;
use crate::timer::TimerService;
use tracing::{debug, error, trace};

/// Mutable machine parts a region reaction may touch.
pub(crate) struct Workspace<'a, D: Domain> {
    pub(crate) fields: &'a mut D::Fields,
    pub(crate) timers: &'a mut TimerService<D>,
    pub(crate) outbox: &'a mut Outbox<D>,
}

impl<'a, D: Domain> Workspace<'a, D> {
    pub(crate) fn fields(&self) -> &D::Fields {
        &*self.fields
    }

    pub(crate) fn ctx<'b>(
        &'b mut self,
        region: usize,
        state: D::State,
        event: Option<&'b D::Event>,
    ) -> HookCtx<'b, D> {
        HookCtx::new(
            &mut *self.fields,
            &mut *self.timers,
            &mut *self.outbox,
            region,
            state,
            event,
        )
    }
}

/// Independent sub-machine with exactly one active state.
pub struct Region<D: Domain> {
    name: String,
    nodes: Vec<StateNode<D>>,
    initial: usize,
    active: usize,
    transitions: Vec<Transition<D>>,
}

impl<D: Domain> Region<D> {
    /// Assemble a region. `initial` indexes into `nodes`; the builder checks
    /// that it is in range.
    pub(crate) fn new(
        name: String,
        nodes: Vec<StateNode<D>>,
        initial: usize,
        transitions: Vec<Transition<D>>,
    ) -> Self {
        Self {
            name,
            nodes,
            initial,
            active: initial,
            transitions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn active_state(&self) -> &D::State {
        self.nodes[self.active].state()
    }

    pub fn initial_state(&self) -> &D::State {
        self.nodes[self.initial].state()
    }

    /// Declared states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &D::State> {
        self.nodes.iter().map(StateNode::state)
    }

    pub fn contains(&self, state: &D::State) -> bool {
        self.position(state).is_some()
    }

    fn position(&self, state: &D::State) -> Option<usize> {
        self.nodes.iter().position(|node| node.state() == state)
    }

    pub fn transitions(&self) -> &[Transition<D>] {
        &self.transitions
    }

    /// Enter the initial state.
    pub(crate) fn start(&mut self, index: usize, ws: &mut Workspace<'_, D>) {
        self.active = self.initial;
        let state = self.active_state().clone();
        self.nodes[self.active].enter(&mut ws.ctx(index, state.clone(), None));
        ws.outbox.effects.push(Effect::StateEntered(state));
    }

    /// Offer an event to the active state.
    ///
    /// The first transition whose source is active, whose event variant
    /// matches and whose guard passes fires. Guards and dynamic targets are
    /// evaluated before any hook runs. Returns `None` when nothing fired.
    pub(crate) fn offer(
        &mut self,
        index: usize,
        event: &D::Event,
        ws: &mut Workspace<'_, D>,
    ) -> Option<TransitionResult<D::State>> {
        let Region {
            name,
            nodes,
            active,
            transitions,
            ..
        } = self;
        let current = nodes[*active].state().clone();

        let mut matched = false;
        let fired = transitions.iter().find(|transition| {
            if !transition.matches(&current, event) {
                return false;
            }
            matched = true;
            transition
                .guard
                .as_ref()
                .is_none_or(|guard| guard.check(ws.fields(), event))
        });

        let Some(transition) = fired else {
            if matched {
                debug!(region = %name, state = ?current, event = event.name(), "guard rejected event");
            }
            return None;
        };

        let Some(to) = transition.target.resolve(ws.fields(), event) else {
            trace!(region = %name, state = ?current, transition = %transition.label(), "internal transition");
            if let Some(action) = &transition.action {
                action(&mut ws.ctx(index, current.clone(), Some(event)));
            }
            return Some(TransitionResult::Internal { state: current });
        };

        let Some(to_index) = nodes.iter().position(|node| node.state() == &to) else {
            error!(
                region = %name,
                transition = %transition.label(),
                target = ?to,
                "transition resolved to a state outside its region"
            );
            return None;
        };

        nodes[*active].exit(&mut ws.ctx(index, current.clone(), Some(event)));
        let cancelled = ws.timers.cancel_owned(index, &current);
        if cancelled > 0 {
            trace!(region = %name, state = ?current, cancelled, "cancelled timers on exit");
        }

        if let Some(action) = &transition.action {
            action(&mut ws.ctx(index, to.clone(), Some(event)));
        }

        *active = to_index;
        nodes[to_index].enter(&mut ws.ctx(index, to.clone(), Some(event)));
        ws.outbox.effects.push(Effect::StateEntered(to.clone()));

        Some(TransitionResult::Moved { from: current, to })
    }
}

impl<D: Domain> std::fmt::Debug for Region<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("active", self.active_state())
            .field("states", &self.nodes.len())
            .field("transitions", &self.transitions.len())
            .finish()
    }
}
