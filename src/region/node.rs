//! Leaf state nodes.

use super::context::{Hook, HookCtx};
use crate::core::Domain;

/// One declared state of a region with its entry and exit hooks.
///
/// A node exists once per declared state and lives as long as the machine.
pub struct StateNode<D: Domain> {
    state: D::State,
    on_entry: Vec<Hook<D>>,
    on_exit: Vec<Hook<D>>,
}

impl<D: Domain> StateNode<D> {
    pub fn new(state: D::State) -> Self {
        Self {
            state,
            on_entry: Vec::new(),
            on_exit: Vec::new(),
        }
    }

    pub fn state(&self) -> &D::State {
        &self.state
    }

    pub(crate) fn add_entry(&mut self, hook: Hook<D>) {
        self.on_entry.push(hook);
    }

    pub(crate) fn add_exit(&mut self, hook: Hook<D>) {
        self.on_exit.push(hook);
    }

    pub(crate) fn enter(&self, ctx: &mut HookCtx<'_, D>) {
        for hook in &self.on_entry {
            hook(ctx);
        }
    }

    pub(crate) fn exit(&self, ctx: &mut HookCtx<'_, D>) {
        for hook in &self.on_exit {
            hook(ctx);
        }
    }
}

impl<D: Domain> std::fmt::Debug for StateNode<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateNode")
            .field("state", &self.state)
            .field("on_entry", &self.on_entry.len())
            .field("on_exit", &self.on_exit.len())
            .finish()
    }
}
