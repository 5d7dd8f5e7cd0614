//! Builder for constructing regions.

use crate::builder::error::{accumulate, fail, require, BuildError, BuildErrors, Check};
use crate::builder::transition::TransitionBuilder;
use crate::core::{Domain, State};
use crate::region::{Hook, HookCtx, Region, StateNode, Target};

/// Builder for one region: its states, hooks and transition table.
///
/// Nothing is validated until [`build`](Self::build), which reports every
/// problem at once.
pub struct RegionBuilder<D: Domain> {
    name: String,
    initial: Option<D::State>,
    states: Vec<D::State>,
    entry: Vec<(D::State, Hook<D>)>,
    exit: Vec<(D::State, Hook<D>)>,
    transitions: Vec<TransitionBuilder<D>>,
}

impl<D: Domain> RegionBuilder<D> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: None,
            states: Vec::new(),
            entry: Vec::new(),
            exit: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the state entered when the machine starts (required).
    ///
    /// The state is declared if it was not already.
    pub fn initial(mut self, state: D::State) -> Self {
        self.initial = Some(state);
        self
    }

    /// Declare a state.
    pub fn state(mut self, state: D::State) -> Self {
        self.states.push(state);
        self
    }

    /// Declare several states.
    pub fn states(mut self, states: impl IntoIterator<Item = D::State>) -> Self {
        self.states.extend(states);
        self
    }

    /// Run `hook` whenever `state` is entered. Hooks run in the order added.
    pub fn on_entry<F>(mut self, state: D::State, hook: F) -> Self
    where
        F: Fn(&mut HookCtx<'_, D>) + Send + Sync + 'static,
    {
        self.entry.push((state, Box::new(hook)));
        self
    }

    /// Run `hook` whenever `state` is exited.
    pub fn on_exit<F>(mut self, state: D::State, hook: F) -> Self
    where
        F: Fn(&mut HookCtx<'_, D>) + Send + Sync + 'static,
    {
        self.exit.push((state, Box::new(hook)));
        self
    }

    /// Add a transition. Earlier transitions win when several match.
    pub fn transition(mut self, transition: TransitionBuilder<D>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Build the region.
    pub fn build(self) -> Result<Region<D>, BuildErrors> {
        let RegionBuilder {
            name,
            initial,
            mut states,
            entry,
            exit,
            transitions,
        } = self;

        let mut checks: Vec<Check> = Vec::new();

        for (index, state) in states.iter().enumerate() {
            if states[..index].contains(state) {
                checks.push(fail(BuildError::DuplicateState {
                    region: name.clone(),
                    state: state.name().to_string(),
                }));
            }
        }

        if let Some(initial) = &initial {
            if !states.contains(initial) {
                states.insert(0, initial.clone());
            }
        }
        checks.push(require(!states.is_empty(), || BuildError::EmptyRegion {
            region: name.clone(),
        }));
        checks.push(require(initial.is_some(), || {
            BuildError::MissingInitialState {
                region: name.clone(),
            }
        }));

        let declared = |state: &D::State, context: &str| {
            require(states.contains(state), || BuildError::UndeclaredState {
                region: name.clone(),
                state: state.name().to_string(),
                context: context.to_string(),
            })
        };

        for (state, _) in &entry {
            checks.push(declared(state, "Entry hook"));
        }
        for (state, _) in &exit {
            checks.push(declared(state, "Exit hook"));
        }

        let mut table = Vec::with_capacity(transitions.len());
        for builder in transitions {
            match builder.build() {
                Ok(transition) => {
                    let context = format!("Transition '{}'", transition.label());
                    checks.push(declared(transition.from(), &context));
                    if let Target::Fixed(target) = transition.target() {
                        checks.push(declared(target, &context));
                    }
                    table.push(transition);
                }
                Err(errors) => checks.extend(errors.into_iter().map(fail)),
            }
        }

        accumulate(checks)?;

        let mut nodes: Vec<StateNode<D>> = states.into_iter().map(StateNode::new).collect();
        for (state, hook) in entry {
            if let Some(node) = nodes.iter_mut().find(|node| node.state() == &state) {
                node.add_entry(hook);
            }
        }
        for (state, hook) in exit {
            if let Some(node) = nodes.iter_mut().find(|node| node.state() == &state) {
                node.add_exit(hook);
            }
        }

        let initial = initial
            .and_then(|initial| nodes.iter().position(|node| node.state() == &initial))
            .ok_or_else(|| BuildError::MissingInitialState {
                region: name.clone(),
            })?;

        Ok(Region::new(name, nodes, initial, table))
    }
}
