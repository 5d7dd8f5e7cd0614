//! Hero Machine
//!
//! This example drives the platformer hero in real time.
//!
//! Key concepts:
//! - Two parallel regions reacting to the same controller input
//! - Timers owned by states (jump airtime, shooting ticker)
//! - The tokio driver moving the machine clock with wall time
//! - Consuming one-shot effects as an async stream
//!
//! Run with: RUST_LOG=orthogon=debug cargo run --example hero

use orthogon::hero::{self, ControlEvent, HeroConfig, HeroNotice};
use orthogon::timer::driver;
use orthogon::{Effect, Event, ModelBridge, State};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Hero Machine ===\n");

    let config = HeroConfig {
        initial_ammo: 5,
        ..HeroConfig::default()
    };
    let hero = hero::build(&config).expect("hero definition is valid");
    let mut effects = hero.effect_stream();
    let driver = driver::spawn(hero.clone());

    let printer = tokio::spawn(async move {
        let mut shots = 0;
        while let Some(effect) = effects.recv().await {
            match effect {
                Effect::StateEntered(state) => println!("  entered {}", state.name()),
                Effect::ControlEventSent(event) => println!("  input   {}", event.name()),
                Effect::Notice(HeroNotice::AmmoDecremented) => shots += 1,
            }
        }
        shots
    });

    let script = [
        (ControlEvent::FirePress, 0),
        (ControlEvent::JumpPress, 120),
        (ControlEvent::DuckPress, 300),
        (ControlEvent::DuckRelease, 500),
        (ControlEvent::FireRelease, 200),
    ];
    for (input, wait_ms) in script {
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        hero.send(input).expect("hero is running");
    }
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let snapshot = hero.latest_snapshot();
    println!("\nFinal snapshot:");
    println!("  active states: {:?}", snapshot.active_states);
    println!("  ammo left:     {}", snapshot.ammo_left);

    hero.shutdown();
    driver.await.expect("driver task");
    // The stream ends once the machine, and with it the bus, is gone.
    drop(hero);
    if let Ok(Ok(shots)) = tokio::time::timeout(Duration::from_millis(100), printer).await {
        println!("  shots fired:   {shots}");
    }

    println!("\n=== Example Complete ===");
}
