//! Builder for constructing transitions.

use crate::builder::error::{accumulate, require, BuildError, BuildErrors};
use crate::core::{Domain, Event, Guard};
use crate::region::{Hook, HookCtx, Target, Transition};

/// Builder for constructing transitions with a fluent API.
///
/// A transition needs a source state, a triggering event and a target. The
/// event value only selects the variant; payloads are ignored when matching.
pub struct TransitionBuilder<D: Domain> {
    name: Option<String>,
    from: Option<D::State>,
    on: Option<D::Event>,
    guard: Option<Guard<D>>,
    target: Option<Target<D>>,
    action: Option<Hook<D>>,
}

impl<D: Domain> TransitionBuilder<D> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            name: None,
            from: None,
            on: None,
            guard: None,
            target: None,
            action: None,
        }
    }

    /// Name used in logs and errors (optional).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source state (required).
    pub fn from(mut self, state: D::State) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the triggering event variant (required).
    pub fn on(mut self, event: D::Event) -> Self {
        self.on = Some(event);
        self
    }

    /// Add a guard (optional).
    pub fn guard(mut self, guard: Guard<D>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&D::Fields, &D::Event) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Move to a fixed state.
    pub fn to(mut self, state: D::State) -> Self {
        self.target = Some(Target::Fixed(state));
        self
    }

    /// Move to the state `resolver` picks when the event is delivered.
    pub fn resolve<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&D::Fields, &D::Event) -> D::State + Send + Sync + 'static,
    {
        self.target = Some(Target::Dynamic(Box::new(resolver)));
        self
    }

    /// Stay in the source state without exiting it; only the action runs.
    pub fn internal(mut self) -> Self {
        self.target = Some(Target::Internal);
        self
    }

    /// Run `action` between the exit and entry hooks (optional).
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut HookCtx<'_, D>) + Send + Sync + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    fn describe(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let from = self
            .from
            .as_ref()
            .map_or_else(|| "?".to_string(), |state| format!("{state:?}"));
        let on = self.on.as_ref().map_or("?", |event| event.name());
        format!("{from} --{on}-->")
    }

    /// Build the transition, reporting every missing part at once.
    pub fn build(self) -> Result<Transition<D>, BuildErrors> {
        let label = self.describe();
        accumulate(vec![
            require(self.from.is_some(), || BuildError::MissingFromState {
                transition: label.clone(),
            }),
            require(self.on.is_some(), || BuildError::MissingEvent {
                transition: label.clone(),
            }),
            require(self.target.is_some(), || BuildError::MissingTarget {
                transition: label.clone(),
            }),
        ])?;

        match (self.from, self.on, self.target) {
            (Some(from), Some(on), Some(target)) => Ok(Transition {
                name: self.name,
                from,
                on,
                guard: self.guard,
                target,
                action: self.action,
            }),
            _ => Err(BuildErrors::from(BuildError::MissingTarget { transition: label })),
        }
    }
}

impl<D: Domain> Default for TransitionBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}
