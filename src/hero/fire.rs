//! Fire region: a ticker spends ammunition while the trigger is held.

use super::{transition, ControlEvent, Hero, HeroNotice, HeroState};
use crate::builder::RegionBuilder;
use crate::region::HookCtx;
use std::time::Duration;

pub const REGION: &str = "Fire";

fn shoot(ctx: &mut HookCtx<'_, Hero>) {
    let shooting = &mut ctx.fields_mut().shooting;
    if shooting.ammo_left == 0 {
        ctx.raise(ControlEvent::OutOfAmmo);
        return;
    }
    shooting.ammo_left -= 1;
    ctx.emit(HeroNotice::AmmoDecremented);
}

/// Build the Fire region. The first shot goes off on the trigger press,
/// then one every `interval`.
pub fn region(interval: Duration) -> RegionBuilder<Hero> {
    use ControlEvent::*;
    use HeroState::*;

    super::region(REGION)
        .initial(NotShooting)
        .state(Shooting)
        .on_entry(Shooting, move |ctx| {
            let ticker = ctx.schedule_ticker(interval, shoot);
            ctx.fields_mut().shooting.ticker = Some(ticker);
        })
        .on_exit(Shooting, |ctx| {
            if let Some(ticker) = ctx.fields_mut().shooting.ticker.take() {
                ctx.cancel(ticker);
            }
        })
        .transition(
            transition()
                .name("Fire")
                .from(NotShooting)
                .on(FirePress)
                .when(|fields, _| fields.shooting.ammo_left > 0)
                .to(Shooting),
        )
        .transition(
            transition()
                .name("Cease fire")
                .from(Shooting)
                .on(FireRelease)
                .to(NotShooting),
        )
        .transition(
            transition()
                .name("Out of ammo")
                .from(Shooting)
                .on(OutOfAmmo)
                .to(NotShooting),
        )
}
