//! Guard predicates for controlling transitions.
//!
//! Guards are pure boolean functions over the current field table and the
//! triggering event. They run before any hook and must not mutate anything.

use super::domain::Domain;

/// Pure predicate that determines if a transition can fire.
///
/// # Example
///
/// ```rust
/// use orthogon::core::{Domain, Guard};
/// # use orthogon::{event_enum, state_enum};
/// # state_enum! { enum Light { On, Off } }
/// # event_enum! { enum Switch { Flip } }
/// # struct Lamp;
/// # impl Domain for Lamp {
/// #     type State = Light;
/// #     type Event = Switch;
/// #     type Fields = u32;
/// #     type Notice = ();
/// #     type Model = u32;
/// #     fn model(fields: &u32, _active: &[Light]) -> u32 { *fields }
/// # }
///
/// let has_power = Guard::<Lamp>::new(|watts: &u32, _event| *watts > 0);
///
/// assert!(has_power.check(&60, &Switch::Flip));
/// assert!(!has_power.check(&0, &Switch::Flip));
/// ```
pub struct Guard<D: Domain> {
    predicate: Box<dyn Fn(&D::Fields, &D::Event) -> bool + Send + Sync>,
}

impl<D: Domain> Guard<D> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&D::Fields, &D::Event) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Check if the guard allows the transition.
    pub fn check(&self, fields: &D::Fields, event: &D::Event) -> bool {
        (self.predicate)(fields, event)
    }
}

impl<D: Domain> std::fmt::Debug for Guard<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Guard(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event_enum, state_enum};

    state_enum! {
        enum Valve {
            Open,
            Shut,
        }
    }

    event_enum! {
        enum Command {
            Open,
            Close,
        }
    }

    struct Pipe;

    impl Domain for Pipe {
        type State = Valve;
        type Event = Command;
        type Fields = i64;
        type Notice = ();
        type Model = i64;

        fn model(fields: &i64, _active: &[Valve]) -> i64 {
            *fields
        }
    }

    #[test]
    fn guard_reads_fields() {
        let guard = Guard::<Pipe>::new(|pressure, _| *pressure < 100);

        assert!(guard.check(&10, &Command::Open));
        assert!(!guard.check(&150, &Command::Open));
    }

    #[test]
    fn guard_reads_event() {
        let guard = Guard::<Pipe>::new(|_, event| matches!(event, Command::Close));

        assert!(guard.check(&0, &Command::Close));
        assert!(!guard.check(&0, &Command::Open));
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::<Pipe>::new(|pressure, _| *pressure % 2 == 0);

        let result1 = guard.check(&4, &Command::Open);
        let result2 = guard.check(&4, &Command::Open);

        assert_eq!(result1, result2);
    }
}
