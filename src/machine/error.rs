//! Runtime errors.

use thiserror::Error;

/// Errors returned by a running machine.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("Machine '{machine}' has been shut down")]
    Shutdown { machine: String },

    #[error("Machine '{machine}' has no region named '{region}'")]
    UnknownRegion { machine: String, region: String },

    #[error("Region '{region}' has no state named '{state}'")]
    UnknownState { region: String, state: String },

    #[error("Event '{event}' is raised internally and cannot be sent from outside")]
    InternalEvent { event: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_culprit() {
        let err = MachineError::UnknownState {
            region: "Fire".to_string(),
            state: "Reloading".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Region 'Fire' has no state named 'Reloading'"
        );

        let err = MachineError::Shutdown {
            machine: "Hero".to_string(),
        };
        assert!(err.to_string().contains("shut down"));
    }
}
