//! State transition history tracking.
//!
//! Keeps an immutable, bounded record of the transitions each region took,
//! for diagnostics and tests.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of records a history keeps before evicting the oldest.
pub const DEFAULT_HISTORY_CAPACITY: usize = 128;

/// Record of a single region transition.
///
/// # Example
///
/// ```rust
/// use orthogon::core::StateTransition;
/// use orthogon::state_enum;
/// use chrono::Utc;
///
/// state_enum! {
///     enum Phase { Idle, Active }
/// }
///
/// let transition = StateTransition {
///     region: "Main".to_string(),
///     from: Phase::Idle,
///     to: Phase::Active,
///     trigger: "Start".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.region, "Main");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// Region that changed its active state
    pub region: String,
    /// The state being exited
    pub from: S,
    /// The state being entered
    pub to: S,
    /// Name of the event that fired the transition
    pub trigger: String,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded history of transitions across all regions.
///
/// History is immutable - `record` returns a new history with the transition
/// added, evicting the oldest record once `capacity` is reached.
///
/// # Example
///
/// ```rust
/// use orthogon::core::{StateHistory, StateTransition};
/// use orthogon::state_enum;
/// use chrono::Utc;
///
/// state_enum! {
///     enum Step { A, B, C }
/// }
///
/// let history = StateHistory::new();
/// let history = history.record(StateTransition {
///     region: "Main".to_string(),
///     from: Step::A,
///     to: Step::B,
///     trigger: "Next".to_string(),
///     timestamp: Utc::now(),
/// });
/// let history = history.record(StateTransition {
///     region: "Main".to_string(),
///     from: Step::B,
///     to: Step::C,
///     trigger: "Next".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.path("Main"), vec![&Step::A, &Step::B, &Step::C]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: VecDeque<StateTransition<S>>,
    capacity: usize,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a new empty history keeping at most `capacity` records.
    ///
    /// A capacity of zero keeps nothing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// The existing history is not mutated.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        if self.capacity == 0 {
            return self.clone();
        }
        let mut transitions = self.transitions.clone();
        while transitions.len() >= self.capacity {
            transitions.pop_front();
        }
        transitions.push_back(transition);
        Self {
            transitions,
            capacity: self.capacity,
        }
    }

    /// Get the path of states one region traversed.
    ///
    /// Returns the `from` of the region's first retained transition, then the
    /// `to` of each of its transitions in order.
    pub fn path(&self, region: &str) -> Vec<&S> {
        let mut path = Vec::new();
        let mut records = self.transitions.iter().filter(|t| t.region == region);
        if let Some(first) = records.next() {
            path.push(&first.from);
            path.push(&first.to);
        }
        for transition in records {
            path.push(&transition.to);
        }
        path
    }

    /// Calculate total duration from first to last retained transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all retained transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition<S>> {
        self.transitions.iter()
    }

    /// Number of retained transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_enum;

    state_enum! {
        enum TestState {
            Initial,
            Processing,
            Complete,
        }
    }

    fn record(region: &str, from: TestState, to: TestState) -> StateTransition<TestState> {
        StateTransition {
            region: region.to_string(),
            from,
            to,
            trigger: "Test".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<TestState> = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.path("Main").is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = StateHistory::new();

        let new_history = history.record(record("Main", TestState::Initial, TestState::Processing));

        assert_eq!(history.len(), 0);
        assert_eq!(new_history.len(), 1);
    }

    #[test]
    fn path_is_per_region() {
        let history = StateHistory::new()
            .record(record("Main", TestState::Initial, TestState::Processing))
            .record(record("Side", TestState::Complete, TestState::Initial))
            .record(record("Main", TestState::Processing, TestState::Complete));

        assert_eq!(
            history.path("Main"),
            vec![
                &TestState::Initial,
                &TestState::Processing,
                &TestState::Complete
            ]
        );
        assert_eq!(
            history.path("Side"),
            vec![&TestState::Complete, &TestState::Initial]
        );
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = StateHistory::with_capacity(2);
        history = history.record(record("Main", TestState::Initial, TestState::Processing));
        history = history.record(record("Main", TestState::Processing, TestState::Complete));
        history = history.record(record("Main", TestState::Complete, TestState::Initial));

        assert_eq!(history.len(), 2);
        let first = history.transitions().next().unwrap();
        assert_eq!(first.from, TestState::Processing);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let history = StateHistory::with_capacity(0)
            .record(record("Main", TestState::Initial, TestState::Processing));
        assert!(history.is_empty());
    }

    #[test]
    fn single_transition_has_duration_zero() {
        let history =
            StateHistory::new().record(record("Main", TestState::Initial, TestState::Processing));

        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let history =
            StateHistory::new().record(record("Main", TestState::Initial, TestState::Processing));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<TestState> = serde_json::from_str(&json).unwrap();

        assert_eq!(history.len(), deserialized.len());
        assert_eq!(deserialized.capacity(), DEFAULT_HISTORY_CAPACITY);
    }
}
