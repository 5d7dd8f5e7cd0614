//! The hero: a platformer character whose movement and weapon are two
//! parallel regions of one machine.
//!
//! - **Movement**: Standing, Jumping, Ducking, AirAttacking. A jump lands
//!   after a fixed airtime; pressing duck mid-air attacks, and the landing
//!   state depends on whether duck is still held when the hero lands.
//! - **Fire**: NotShooting, Shooting. Pressing the trigger fires at once;
//!   while it is held a ticker spends one more round per interval until the
//!   magazine is empty.
//!
//! # Example
//!
//! ```
//! use orthogon::hero::{self, ControlEvent, HeroConfig, HeroState};
//! use orthogon::ModelBridge;
//! use std::time::Duration;
//!
//! let hero = hero::build(&HeroConfig::default()).unwrap();
//! hero.send(ControlEvent::FirePress).unwrap();
//! hero.advance_time(Duration::from_millis(100)).unwrap();
//!
//! let snapshot = hero.latest_snapshot();
//! // shots at 0, 50 and 100 ms
//! assert_eq!(snapshot.ammo_left, 37);
//! assert!(snapshot.active_states.contains(&HeroState::Shooting));
//! ```

mod config;
pub mod fire;
pub mod movement;

pub use config::{
    HeroConfig, DEFAULT_INITIAL_AMMO, DEFAULT_JUMP_DURATION_MS, DEFAULT_SHOOTING_INTERVAL_MS,
};

use crate::builder::{BuildError, BuildErrors, MachineBuilder, RegionBuilder, TransitionBuilder};
use crate::core::{Domain, Event};
use crate::effects::DomainEffect;
use crate::machine::{Machine, MachineError};
use crate::timer::TimerHandle;
use crate::{event_enum, state_enum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MACHINE: &str = "Hero";

state_enum! {
    /// Every state of both hero regions.
    pub enum HeroState {
        Standing,
        Jumping,
        Ducking,
        AirAttacking,
        NotShooting,
        Shooting,
    }
}

event_enum! {
    /// Controller input plus the two events the hero raises itself.
    pub enum ControlEvent {
        JumpPress,
        /// Raised when the airtime is over.
        JumpComplete,
        DuckPress,
        DuckRelease,
        FirePress,
        FireRelease,
        /// Raised by the ticker on an empty magazine.
        OutOfAmmo,
    }
}

impl ControlEvent {
    /// Events only the hero itself may raise.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::JumpComplete | Self::OutOfAmmo)
    }
}

/// One-shot notices of the hero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeroNotice {
    AmmoDecremented,
}

/// Effect type of the hero machine.
pub type HeroEffect = DomainEffect<Hero>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JumpingFields {
    /// Clock reading at which the current jump lands.
    pub landing_at: Duration,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AirAttackingFields {
    pub duck_held: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShootingFields {
    pub ammo_left: u32,
    pub initial_ammo: u32,
    pub ticker: Option<TimerHandle>,
}

/// Per-state fields of the hero. They outlive activations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeroFields {
    pub jumping: JumpingFields,
    pub air_attacking: AirAttackingFields,
    pub shooting: ShootingFields,
}

impl HeroFields {
    pub fn new(initial_ammo: u32) -> Self {
        Self {
            shooting: ShootingFields {
                ammo_left: initial_ammo,
                initial_ammo,
                ticker: None,
            },
            ..Self::default()
        }
    }
}

/// What the screen shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroModel {
    pub ammo_left: u32,
    pub active_states: Vec<HeroState>,
}

impl HeroModel {
    pub fn is_active(&self, state: HeroState) -> bool {
        self.active_states.contains(&state)
    }
}

/// Type bundle of the hero machine.
#[derive(Clone, Copy, Debug)]
pub struct Hero;

impl Domain for Hero {
    type State = HeroState;
    type Event = ControlEvent;
    type Fields = HeroFields;
    type Notice = HeroNotice;
    type Model = HeroModel;

    fn model(fields: &HeroFields, active: &[HeroState]) -> HeroModel {
        HeroModel {
            ammo_left: fields.shooting.ammo_left,
            active_states: active.to_vec(),
        }
    }
}

fn region(name: &str) -> RegionBuilder<Hero> {
    RegionBuilder::new(name)
}

fn transition() -> TransitionBuilder<Hero> {
    TransitionBuilder::new()
}

/// Describe the hero machine without building it, e.g. to add a listener.
pub fn builder(config: &HeroConfig) -> MachineBuilder<Hero> {
    Machine::builder(MACHINE, HeroFields::new(config.initial_ammo))
        .config(config.machine.clone())
        .region(movement::region(config.jump_duration()))
        .region(fire::region(config.shooting_interval()))
}

/// Validate `config`, then build and start the hero machine.
pub fn build(config: &HeroConfig) -> Result<Machine<Hero>, BuildErrors> {
    config.validate().map_err(|error| BuildError::InvalidConfig {
        reason: error.to_string(),
    })?;
    builder(config).build()
}

impl Machine<Hero> {
    /// Deliver controller input. Events the hero raises itself are
    /// rejected.
    pub fn send(&self, event: ControlEvent) -> Result<(), MachineError> {
        if event.is_internal() {
            return Err(MachineError::InternalEvent {
                event: event.name().to_string(),
            });
        }
        self.process_event(event)
    }

    /// Refill the magazine. Active states and a running ticker are left
    /// alone.
    pub fn reload_ammo(&self) -> Result<(), MachineError> {
        self.command(|fields: &mut HeroFields| {
            fields.shooting.ammo_left = fields.shooting.initial_ammo;
        })
    }
}
