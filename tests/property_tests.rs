//! Property-based tests for the runtime.
//!
//! These tests use proptest to drive the hero machine with random input and
//! time sequences and check that the runtime invariants hold after every
//! step.

use chrono::Utc;
use orthogon::core::{Guard, StateHistory, StateTransition};
use orthogon::hero::{
    self, ControlEvent, Hero, HeroConfig, HeroFields, HeroNotice, HeroState,
};
use orthogon::{Effect, Event, Machine, ModelBridge, State};
use proptest::prelude::*;
use std::time::Duration;

const MOVEMENT: [HeroState; 4] = [
    HeroState::Standing,
    HeroState::Jumping,
    HeroState::Ducking,
    HeroState::AirAttacking,
];
const FIRE: [HeroState; 2] = [HeroState::NotShooting, HeroState::Shooting];

#[derive(Clone, Debug)]
enum Step {
    Send(ControlEvent),
    Wait(u64),
    Reload,
}

prop_compose! {
    fn arbitrary_input()(variant in 0..5u8) -> ControlEvent {
        match variant {
            0 => ControlEvent::JumpPress,
            1 => ControlEvent::DuckPress,
            2 => ControlEvent::DuckRelease,
            3 => ControlEvent::FirePress,
            _ => ControlEvent::FireRelease,
        }
    }
}

fn arbitrary_step(with_reload: bool) -> BoxedStrategy<Step> {
    let send = arbitrary_input().prop_map(Step::Send);
    let wait = (0..400u64).prop_map(Step::Wait);
    if with_reload {
        prop_oneof![4 => send, 4 => wait, 1 => Just(Step::Reload)].boxed()
    } else {
        prop_oneof![send, wait].boxed()
    }
}

prop_compose! {
    fn arbitrary_config()(
        jump in 20..500u64,
        interval in 5..80u64,
        ammo in 0..12u32,
    ) -> HeroConfig {
        HeroConfig {
            jump_duration_ms: jump,
            shooting_interval_ms: interval,
            initial_ammo: ammo,
            ..HeroConfig::default()
        }
    }
}

fn apply(machine: &Machine<Hero>, step: &Step) {
    match step {
        Step::Send(event) => machine.send(*event).unwrap(),
        Step::Wait(ms) => machine.advance_time(Duration::from_millis(*ms)).unwrap(),
        Step::Reload => machine.reload_ammo().unwrap(),
    }
}

fn check_invariants(machine: &Machine<Hero>, config: &HeroConfig) -> Result<(), TestCaseError> {
    let active = machine.active_states();
    prop_assert_eq!(active.len(), 2);
    prop_assert!(MOVEMENT.contains(&active[0]));
    prop_assert!(FIRE.contains(&active[1]));

    for timer in machine.pending_timers() {
        prop_assert_eq!(&timer.owner.state, &active[timer.owner.region]);
    }

    let fire_timers = machine
        .pending_timers()
        .iter()
        .filter(|timer| timer.owner.region == 1)
        .count();
    let expected = usize::from(active[1] == HeroState::Shooting);
    prop_assert_eq!(fire_timers, expected);

    let snapshot = machine.latest_snapshot();
    prop_assert!(snapshot.ammo_left <= config.initial_ammo);
    prop_assert_eq!(&snapshot.active_states, &active);
    Ok(())
}

proptest! {
    #[test]
    fn invariants_hold_after_every_step(
        config in arbitrary_config(),
        steps in prop::collection::vec(arbitrary_step(true), 1..40),
    ) {
        let machine = hero::build(&config).unwrap();
        check_invariants(&machine, &config)?;

        for step in &steps {
            apply(&machine, step);
            check_invariants(&machine, &config)?;
        }
    }

    #[test]
    fn every_shot_is_reported_once(
        config in arbitrary_config(),
        steps in prop::collection::vec(arbitrary_step(false), 1..40),
    ) {
        let machine = hero::build(&config).unwrap();
        let mut effects = machine.effect_stream();

        for step in &steps {
            apply(&machine, step);
        }

        let mut shots = 0;
        while let Some(effect) = effects.try_recv() {
            if effect == Effect::Notice(HeroNotice::AmmoDecremented) {
                shots += 1;
            }
        }
        prop_assert_eq!(shots, config.initial_ammo - machine.latest_snapshot().ammo_left);
    }

    #[test]
    fn reload_is_idempotent(
        config in arbitrary_config(),
        steps in prop::collection::vec(arbitrary_step(false), 0..20),
    ) {
        let machine = hero::build(&config).unwrap();
        for step in &steps {
            apply(&machine, step);
        }

        machine.reload_ammo().unwrap();
        let once = machine.latest_snapshot();
        machine.reload_ammo().unwrap();
        let twice = machine.latest_snapshot();

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.ammo_left, config.initial_ammo);
    }

    #[test]
    fn internal_events_never_enter_from_outside(
        config in arbitrary_config(),
        steps in prop::collection::vec(arbitrary_step(false), 0..20),
    ) {
        let machine = hero::build(&config).unwrap();
        for step in &steps {
            apply(&machine, step);
        }
        let before = machine.latest_snapshot();

        prop_assert!(machine.send(ControlEvent::JumpComplete).is_err());
        prop_assert!(machine.send(ControlEvent::OutOfAmmo).is_err());
        prop_assert_eq!(machine.latest_snapshot(), before);
    }

    #[test]
    fn guard_is_deterministic(ammo in 0..50u32, event in arbitrary_input()) {
        let guard = Guard::<Hero>::new(|fields: &HeroFields, _| fields.shooting.ammo_left > 0);
        let fields = HeroFields::new(ammo);

        let result1 = guard.check(&fields, &event);
        let result2 = guard.check(&fields, &event);
        prop_assert_eq!(result1, result2);
        prop_assert_eq!(result1, ammo > 0);
    }

    #[test]
    fn event_kind_matches_name(a in arbitrary_input(), b in arbitrary_input()) {
        prop_assert_eq!(a.same_kind(&b), a.name() == b.name());
    }

    #[test]
    fn history_is_bounded_and_keeps_latest(
        capacity in 0..20usize,
        moves in prop::collection::vec(0..4usize, 0..50),
    ) {
        let mut history = StateHistory::with_capacity(capacity);
        for (index, to) in moves.iter().enumerate() {
            history = history.record(StateTransition {
                region: "Movement".to_string(),
                from: MOVEMENT[index % 4],
                to: MOVEMENT[*to],
                trigger: format!("step{index}"),
                timestamp: Utc::now(),
            });
        }

        prop_assert_eq!(history.len(), moves.len().min(capacity));
        if capacity > 0 {
            if let Some(last) = moves.last() {
                let recorded = history.transitions().last().unwrap();
                prop_assert_eq!(recorded.to.name(), MOVEMENT[*last].name());
            }
        }
    }
}
