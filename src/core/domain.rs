//! The `Domain` trait binds together the types one machine works with.

use super::state::{Event, State};
use std::fmt::Debug;

/// Type bundle describing one kind of machine.
///
/// A domain names its states, its events, the table of per-state mutable
/// fields, the one-shot notices its hooks may emit, and the immutable model
/// published after every unit of work.
///
/// `model` must be a pure projection: it is called by the dispatcher after
/// each processed event, timer fire or command, and the result replaces the
/// previous snapshot wholesale.
pub trait Domain: Sized + Send + Sync + 'static {
    type State: State;
    type Event: Event;
    /// Out-of-band per-state fields, keyed by state in whatever shape the
    /// domain finds convenient (usually one sub-struct per state).
    type Fields: Send + 'static;
    type Notice: Clone + Debug + Send + 'static;
    type Model: Clone + PartialEq + Debug + Send + Sync + 'static;

    /// Project the externally visible model from fields and active states.
    fn model(fields: &Self::Fields, active: &[Self::State]) -> Self::Model;
}
