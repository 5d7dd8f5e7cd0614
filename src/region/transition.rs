//! Transitions and target resolution.

use super::context::Hook;
use crate::core::{Domain, Event, Guard};

/// Function computing a transition's destination at delivery time.
pub type Resolver<D> = Box<
    dyn Fn(&<D as Domain>::Fields, &<D as Domain>::Event) -> <D as Domain>::State + Send + Sync,
>;

/// Where a transition leads.
pub enum Target<D: Domain> {
    /// Fixed at declaration time.
    Fixed(D::State),
    /// Computed from the field table when the event is delivered.
    Dynamic(Resolver<D>),
    /// No state change: only the transition's action runs.
    Internal,
}

impl<D: Domain> Target<D> {
    /// Resolve the destination. `None` means an internal transition.
    ///
    /// Dynamic resolvers only read the fields, so this is pure.
    pub fn resolve(&self, fields: &D::Fields, event: &D::Event) -> Option<D::State> {
        match self {
            Target::Fixed(state) => Some(state.clone()),
            Target::Dynamic(resolver) => Some(resolver(fields, event)),
            Target::Internal => None,
        }
    }
}

impl<D: Domain> std::fmt::Debug for Target<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Fixed(state) => f.debug_tuple("Fixed").field(state).finish(),
            Target::Dynamic(_) => f.write_str("Dynamic(..)"),
            Target::Internal => f.write_str("Internal"),
        }
    }
}

/// Outcome of a transition that fired.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionResult<S> {
    /// The region exited `from` and entered `to` (possibly the same state).
    Moved { from: S, to: S },
    /// Only the action ran; `state` stayed active.
    Internal { state: S },
}

/// A row of a region's transition table.
pub struct Transition<D: Domain> {
    pub(crate) name: Option<String>,
    pub(crate) from: D::State,
    pub(crate) on: D::Event,
    pub(crate) guard: Option<Guard<D>>,
    pub(crate) target: Target<D>,
    pub(crate) action: Option<Hook<D>>,
}

impl<D: Domain> Transition<D> {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn from(&self) -> &D::State {
        &self.from
    }

    /// Event whose variant triggers this transition.
    pub fn on(&self) -> &D::Event {
        &self.on
    }

    pub fn target(&self) -> &Target<D> {
        &self.target
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.target, Target::Internal)
    }

    /// Check whether this row applies to the active state and event, ignoring
    /// the guard (pure).
    pub fn matches(&self, current: &D::State, event: &D::Event) -> bool {
        *current == self.from && self.on.same_kind(event)
    }

    /// Check whether this transition can fire (pure).
    pub fn can_fire(&self, current: &D::State, fields: &D::Fields, event: &D::Event) -> bool {
        if !self.matches(current, event) {
            return false;
        }

        self.guard
            .as_ref()
            .is_none_or(|guard| guard.check(fields, event))
    }

    /// Label used in logs: the transition's name, or `from --event-->`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{:?} --{}-->", self.from, self.on.name()),
        }
    }
}

impl<D: Domain> std::fmt::Debug for Transition<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("on", &self.on)
            .field("guarded", &self.guard.is_some())
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event_enum, state_enum};

    state_enum! {
        enum Stance {
            Standing,
            Ducking,
        }
    }

    event_enum! {
        enum Button {
            Down,
            Up,
        }
    }

    struct Body;

    impl Domain for Body {
        type State = Stance;
        type Event = Button;
        type Fields = bool;
        type Notice = ();
        type Model = bool;

        fn model(fields: &bool, _active: &[Stance]) -> bool {
            *fields
        }
    }

    fn row(guard: Option<Guard<Body>>, target: Target<Body>) -> Transition<Body> {
        Transition {
            name: None,
            from: Stance::Standing,
            on: Button::Down,
            guard,
            target,
            action: None,
        }
    }

    #[test]
    fn can_fire_matches_state_and_event() {
        let transition = row(None, Target::Fixed(Stance::Ducking));

        assert!(transition.can_fire(&Stance::Standing, &false, &Button::Down));
        assert!(!transition.can_fire(&Stance::Ducking, &false, &Button::Down));
        assert!(!transition.can_fire(&Stance::Standing, &false, &Button::Up));
    }

    #[test]
    fn can_fire_respects_guard() {
        let transition = row(
            Some(Guard::new(|allowed: &bool, _| *allowed)),
            Target::Fixed(Stance::Ducking),
        );

        assert!(transition.can_fire(&Stance::Standing, &true, &Button::Down));
        assert!(!transition.can_fire(&Stance::Standing, &false, &Button::Down));
        assert!(transition.matches(&Stance::Standing, &Button::Down));
    }

    #[test]
    fn dynamic_target_reads_fields_at_resolution() {
        let target: Target<Body> = Target::Dynamic(Box::new(|held: &bool, _: &Button| {
            if *held {
                Stance::Ducking
            } else {
                Stance::Standing
            }
        }));

        assert_eq!(target.resolve(&true, &Button::Up), Some(Stance::Ducking));
        assert_eq!(target.resolve(&false, &Button::Up), Some(Stance::Standing));
    }

    #[test]
    fn internal_target_resolves_to_nothing() {
        let transition = row(None, Target::Internal);

        assert!(transition.is_internal());
        assert_eq!(transition.target().resolve(&false, &Button::Down), None);
    }

    #[test]
    fn label_falls_back_to_shape() {
        let transition = row(None, Target::Fixed(Stance::Ducking));
        assert_eq!(transition.label(), "Standing --Down-->");
    }
}
