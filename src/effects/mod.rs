//! One-shot effects and the boundary a presentation layer binds to.
//!
//! Effects are notifications, not state: each one is delivered to at most one
//! consumer. State is exposed separately as immutable snapshots.
//!
//! # Key Concepts
//!
//! - **Effect**: `StateEntered`, `ControlEventSent` or a domain notice
//! - **Subscription**: detaches its observer or consumer on drop
//! - **ModelBridge**: snapshot, state observers and effect consumer

mod bridge;
mod bus;

use crate::core::Domain;
use serde::{Deserialize, Serialize};

pub use bridge::{ModelBridge, StateObserver};
pub use bus::{EffectReceiver, Subscription, UndeliveredEffects, DEFAULT_EFFECT_BUFFER};

pub(crate) use bridge::StateObservers;
pub(crate) use bus::EffectBus;

/// A one-shot notification produced while processing work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect<S, E, N> {
    /// A region entered this state, including initial entry at build time.
    StateEntered(S),
    /// This event was dispatched to the regions.
    ControlEventSent(E),
    /// Domain-specific notice emitted by a hook.
    Notice(N),
}

/// The effect type of a domain.
pub type DomainEffect<D> =
    Effect<<D as Domain>::State, <D as Domain>::Event, <D as Domain>::Notice>;
