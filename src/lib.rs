//! Orthogon: a parallel-region state machine runtime
//!
//! A machine is a fixed set of regions composed in parallel. Each region has
//! exactly one active state and its own transition table; every event is
//! offered to every region in declaration order. Transitions may be guarded,
//! may resolve their target from the field table at delivery time, and run
//! exit, action and entry hooks in that order.
//!
//! Work is serialized: one event, timer fire or command runs to completion
//! across all regions before the next one starts. Hooks never call back
//! into the machine directly; they raise events and schedule timers through
//! a [`HookCtx`], and both are queued behind the current unit.
//!
//! # Core Concepts
//!
//! - **Domain**: bundles the state, event, field, notice and model types
//! - **Region**: independent sub-machine with one active state
//! - **Timers**: owned by the state that scheduled them, cancelled when it exits
//! - **Effects**: one-shot notices with a single consumer
//! - **Snapshots**: immutable models rebuilt after every unit of work
//!
//! # Example
//!
//! ```rust
//! use orthogon::{Domain, Machine, RegionBuilder, TransitionBuilder};
//! use orthogon::{event_enum, state_enum};
//! use std::time::Duration;
//!
//! state_enum! {
//!     pub enum Door {
//!         Closed,
//!         Open,
//!     }
//! }
//!
//! event_enum! {
//!     pub enum Knob {
//!         Turn,
//!         Swing,
//!     }
//! }
//!
//! struct FrontDoor;
//!
//! impl Domain for FrontDoor {
//!     type State = Door;
//!     type Event = Knob;
//!     type Fields = u32;
//!     type Notice = ();
//!     type Model = (u32, Vec<Door>);
//!
//!     fn model(openings: &u32, active: &[Door]) -> Self::Model {
//!         (*openings, active.to_vec())
//!     }
//! }
//!
//! let door = Machine::<FrontDoor>::builder("FrontDoor", 0)
//!     .region(
//!         RegionBuilder::<FrontDoor>::new("Leaf")
//!             .initial(Door::Closed)
//!             .state(Door::Open)
//!             .on_entry(Door::Open, |ctx| {
//!                 *ctx.fields_mut() += 1;
//!                 ctx.schedule_once(Duration::from_secs(3), |ctx| ctx.raise(Knob::Swing));
//!             })
//!             .transition(TransitionBuilder::<FrontDoor>::new().from(Door::Closed).on(Knob::Turn).to(Door::Open))
//!             .transition(TransitionBuilder::<FrontDoor>::new().from(Door::Open).on(Knob::Swing).to(Door::Closed)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! door.process_event(Knob::Turn).unwrap();
//! assert_eq!(door.active_states(), vec![Door::Open]);
//!
//! door.advance_time(Duration::from_secs(3)).unwrap();
//! assert_eq!(door.active_states(), vec![Door::Closed]);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod effects;
pub mod hero;
pub mod machine;
pub mod region;
pub mod timer;

// Re-export commonly used types
pub use builder::{BuildError, BuildErrors, MachineBuilder, RegionBuilder, TransitionBuilder};
pub use config::{ConfigError, MachineConfig};
pub use crate::core::{Domain, Event, Guard, State, StateHistory, StateTransition};
pub use effects::{
    DomainEffect, Effect, EffectReceiver, ModelBridge, Subscription, UndeliveredEffects,
};
pub use machine::{Machine, MachineError, MachineListener, StateRef, TracingListener};
pub use region::{HookCtx, TransitionResult};
pub use timer::{PendingTimer, TimerHandle, TimerOwner};
