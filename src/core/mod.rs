//! Core state machine types.
//!
//! This module contains the pure building blocks of a machine:
//! - State and event identity via the `State` and `Event` traits
//! - The `Domain` type bundle tying one machine's types together
//! - Guard predicates for transition control
//! - Bounded, immutable transition history
//!
//! Nothing in this module performs side effects.

mod domain;
mod guard;
mod history;
mod state;

pub use domain::Domain;
pub use guard::Guard;
pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
pub use state::{Event, State};
