//! Regions: parallel sub-machines made of leaf states and a transition table.
//!
//! A region reacts to one event at a time on behalf of the dispatcher. Hooks
//! see the machine through a [`HookCtx`], which is the only way they can
//! touch fields, timers, raised events and notices.

mod context;
mod engine;
mod node;
mod transition;

pub use context::{Hook, HookCtx};
pub use engine::Region;
pub use node::StateNode;
pub use transition::{Resolver, Target, Transition, TransitionResult};

pub(crate) use context::Outbox;
pub(crate) use engine::Workspace;
