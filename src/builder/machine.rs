//! Builder for constructing machines.

use crate::builder::error::{accumulate, fail, require, BuildError, BuildErrors, Check};
use crate::builder::region::RegionBuilder;
use crate::config::MachineConfig;
use crate::core::Domain;
use crate::machine::{Machine, MachineListener, TracingListener};

/// Builder for a machine of parallel regions with a fluent API.
pub struct MachineBuilder<D: Domain> {
    name: String,
    fields: D::Fields,
    regions: Vec<RegionBuilder<D>>,
    listener: Option<Box<dyn MachineListener<D>>>,
    config: MachineConfig,
}

impl<D: Domain> MachineBuilder<D> {
    /// Create a builder for a machine named `name` owning `fields`.
    pub fn new(name: impl Into<String>, fields: D::Fields) -> Self {
        Self {
            name: name.into(),
            fields,
            regions: Vec::new(),
            listener: None,
            config: MachineConfig::default(),
        }
    }

    /// Add a region. Regions see every event in the order they were added.
    pub fn region(mut self, region: RegionBuilder<D>) -> Self {
        self.regions.push(region);
        self
    }

    /// Replace the default [`TracingListener`].
    pub fn listener(mut self, listener: impl MachineListener<D> + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build and start the machine.
    ///
    /// Every region enters its initial state before this returns. All
    /// definition errors across all regions are reported together.
    pub fn build(self) -> Result<Machine<D>, BuildErrors> {
        let MachineBuilder {
            name,
            fields,
            regions,
            listener,
            config,
        } = self;

        let mut checks: Vec<Check> = vec![require(!regions.is_empty(), || BuildError::NoRegions)];
        for (index, region) in regions.iter().enumerate() {
            if regions[..index]
                .iter()
                .any(|earlier| earlier.name() == region.name())
            {
                checks.push(fail(BuildError::DuplicateRegion {
                    region: region.name().to_string(),
                }));
            }
        }

        let mut built = Vec::with_capacity(regions.len());
        for region in regions {
            match region.build() {
                Ok(region) => built.push(region),
                Err(errors) => checks.extend(errors.into_iter().map(fail)),
            }
        }

        accumulate(checks)?;

        let listener: Box<dyn MachineListener<D>> = match listener {
            Some(listener) => listener,
            None => Box::new(TracingListener),
        };
        Ok(Machine::start(name, fields, built, listener, &config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransitionBuilder;
    use crate::{event_enum, state_enum};

    state_enum! {
        enum Signal {
            Red,
            Green,
        }
    }

    event_enum! {
        enum Timer {
            Elapsed,
        }
    }

    struct Crossing;

    impl Domain for Crossing {
        type State = Signal;
        type Event = Timer;
        type Fields = u32;
        type Notice = ();
        type Model = Vec<Signal>;

        fn model(_fields: &u32, active: &[Signal]) -> Vec<Signal> {
            active.to_vec()
        }
    }

    fn lights(name: &str) -> RegionBuilder<Crossing> {
        RegionBuilder::<Crossing>::new(name)
            .initial(Signal::Red)
            .state(Signal::Green)
            .transition(
                TransitionBuilder::<Crossing>::new()
                    .from(Signal::Red)
                    .on(Timer::Elapsed)
                    .to(Signal::Green),
            )
    }

    #[test]
    fn builds_and_enters_initial_states() {
        let machine = MachineBuilder::<Crossing>::new("Crossing", 0)
            .region(lights("North"))
            .region(lights("East"))
            .build()
            .unwrap();

        assert_eq!(machine.active_states(), vec![Signal::Red, Signal::Red]);
        assert_eq!(machine.region_names(), vec!["North", "East"]);
    }

    #[test]
    fn requires_a_region() {
        let errors = MachineBuilder::<Crossing>::new("Crossing", 0)
            .build()
            .unwrap_err();

        assert_eq!(errors.errors(), &[BuildError::NoRegions]);
    }

    #[test]
    fn collects_errors_across_regions() {
        let errors = MachineBuilder::<Crossing>::new("Crossing", 0)
            .region(lights("North"))
            .region(lights("North"))
            .region(RegionBuilder::<Crossing>::new("Broken"))
            .build()
            .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&BuildError::DuplicateRegion {
            region: "North".to_string()
        }));
        assert!(errors.contains(&BuildError::EmptyRegion {
            region: "Broken".to_string()
        }));
        assert!(errors.contains(&BuildError::MissingInitialState {
            region: "Broken".to_string()
        }));
    }
}
