//! State and event traits.
//!
//! States and events are plain values. States identify a leaf node inside a
//! region; events identify a trigger. Neither carries mutable data: per-state
//! fields live in the domain's field table.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::mem::{discriminant, Discriminant};

/// Trait for leaf states of a region.
///
/// All methods are pure. A state value is the identity of exactly one
/// state node for the lifetime of a machine.
///
/// # Required Traits
///
/// - `Clone`: states are copied into snapshots and history records
/// - `PartialEq`: the active node is located by comparison
/// - `Debug`: states appear in diagnostics
/// - `Serialize` + `Deserialize`: snapshots and history are serializable
///
/// # Example
///
/// ```rust
/// use orthogon::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "Open");
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for lookup and logging.
    fn name(&self) -> &str;
}

/// Trait for events offered to a machine.
///
/// Transitions are keyed by the event's variant, not its full value, so an
/// event that carries a payload still matches a transition declared with any
/// other value of the same variant.
pub trait Event: Clone + Debug + Send + Sync + 'static {
    /// Get the event's name for logging and effects.
    fn name(&self) -> &str;

    /// Variant key used for transition lookup.
    fn kind(&self) -> Discriminant<Self> {
        discriminant(self)
    }

    /// Check whether two events are of the same variant.
    fn same_kind(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}
