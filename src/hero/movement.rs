//! Movement region: standing, jumping, ducking and attacking in the air.

use super::{transition, ControlEvent, Hero, HeroState};
use crate::builder::RegionBuilder;
use crate::region::HookCtx;
use std::time::Duration;

pub const REGION: &str = "Movement";

fn land(ctx: &mut HookCtx<'_, Hero>) {
    ctx.raise(ControlEvent::JumpComplete);
}

/// Build the Movement region with the given airtime.
///
/// The landing deadline is fixed when the jump starts. Attacking in the air
/// does not extend it: AirAttacking lands at the same moment Jumping would
/// have.
pub fn region(jump_duration: Duration) -> RegionBuilder<Hero> {
    use ControlEvent::*;
    use HeroState::*;

    super::region(REGION)
        .initial(Standing)
        .states([Jumping, Ducking, AirAttacking])
        .on_entry(Jumping, move |ctx| {
            let landing_at = ctx.now() + jump_duration;
            ctx.fields_mut().jumping.landing_at = landing_at;
            ctx.schedule_once(jump_duration, land);
        })
        .on_entry(AirAttacking, |ctx| {
            ctx.fields_mut().air_attacking.duck_held = true;
            let airtime = ctx.fields().jumping.landing_at.saturating_sub(ctx.now());
            ctx.schedule_once(airtime, land);
        })
        .transition(
            transition()
                .name("Jump")
                .from(Standing)
                .on(JumpPress)
                .to(Jumping),
        )
        .transition(
            transition()
                .name("Duck")
                .from(Standing)
                .on(DuckPress)
                .to(Ducking),
        )
        .transition(
            transition()
                .name("AirAttack")
                .from(Jumping)
                .on(DuckPress)
                .to(AirAttacking),
        )
        .transition(
            transition()
                .name("Land after jump")
                .from(Jumping)
                .on(JumpComplete)
                .to(Standing),
        )
        .transition(
            transition()
                .name("StandUp")
                .from(Ducking)
                .on(DuckRelease)
                .to(Standing),
        )
        .transition(
            transition()
                .name("Land after attack")
                .from(AirAttacking)
                .on(JumpComplete)
                .resolve(|fields, _| {
                    if fields.air_attacking.duck_held {
                        Ducking
                    } else {
                        Standing
                    }
                }),
        )
        .transition(
            transition()
                .name("Duck pressed")
                .from(AirAttacking)
                .on(DuckPress)
                .internal()
                .action(|ctx| ctx.fields_mut().air_attacking.duck_held = true),
        )
        .transition(
            transition()
                .name("Duck released")
                .from(AirAttacking)
                .on(DuckRelease)
                .internal()
                .action(|ctx| ctx.fields_mut().air_attacking.duck_held = false),
        )
}
