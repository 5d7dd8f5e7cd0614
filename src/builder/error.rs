//! Definition errors reported by the builders.

use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A problem with a machine definition.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("No regions defined. Add at least one region with .region(..)")]
    NoRegions,

    #[error("Region '{region}' is defined more than once")]
    DuplicateRegion { region: String },

    #[error("Region '{region}' declares no states")]
    EmptyRegion { region: String },

    #[error("Region '{region}' has no initial state. Call .initial(state)")]
    MissingInitialState { region: String },

    #[error("State '{state}' is declared twice in region '{region}'")]
    DuplicateState { region: String, state: String },

    #[error("{context} in region '{region}' refers to undeclared state '{state}'")]
    UndeclaredState {
        region: String,
        state: String,
        context: String,
    },

    #[error("Transition '{transition}' has no source state. Call .from(state)")]
    MissingFromState { transition: String },

    #[error("Transition '{transition}' has no triggering event. Call .on(event)")]
    MissingEvent { transition: String },

    #[error(
        "Transition '{transition}' has no target. Call .to(state), .resolve(f) or .internal()"
    )]
    MissingTarget { transition: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Every problem found in a definition, in discovery order.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{} definition error(s): {}", .0.len(), render(.0))]
pub struct BuildErrors(Vec<BuildError>);

fn render(errors: &[BuildError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl BuildErrors {
    pub fn errors(&self) -> &[BuildError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, error: &BuildError) -> bool {
        self.0.contains(error)
    }

    pub fn into_vec(self) -> Vec<BuildError> {
        self.0
    }
}

impl From<BuildError> for BuildErrors {
    fn from(error: BuildError) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for BuildErrors {
    type Item = BuildError;
    type IntoIter = std::vec::IntoIter<BuildError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Outcome of one definition check.
pub(crate) type Check = Validation<(), NonEmptyVec<BuildError>>;

pub(crate) fn require(ok: bool, error: impl FnOnce() -> BuildError) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

pub(crate) fn fail(error: BuildError) -> Check {
    Validation::fail(error)
}

/// Combine checks, keeping every failure.
pub(crate) fn accumulate(checks: Vec<Check>) -> Result<(), BuildErrors> {
    match Validation::all_vec(checks).map(|_| ()) {
        Validation::Failure(errors) => Err(BuildErrors(errors.iter().cloned().collect())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_keeps_every_failure() {
        let result = accumulate(vec![
            fail(BuildError::NoRegions),
            require(true, || BuildError::NoRegions),
            require(false, || BuildError::EmptyRegion {
                region: "Fire".to_string(),
            }),
        ]);

        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.errors(),
            &[
                BuildError::NoRegions,
                BuildError::EmptyRegion {
                    region: "Fire".to_string()
                }
            ]
        );
    }

    #[test]
    fn accumulate_passes_when_all_pass() {
        assert!(accumulate(vec![require(true, || BuildError::NoRegions)]).is_ok());
        assert!(accumulate(Vec::new()).is_ok());
    }

    #[test]
    fn display_lists_all_errors() {
        let errors = accumulate(vec![
            fail(BuildError::MissingEvent {
                transition: "jump".to_string(),
            }),
            fail(BuildError::MissingTarget {
                transition: "jump".to_string(),
            }),
        ])
        .unwrap_err();

        let message = errors.to_string();
        assert!(message.starts_with("2 definition error(s)"));
        assert!(message.contains("no triggering event"));
        assert!(message.contains("no target"));
    }
}
