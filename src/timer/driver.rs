//! Real-time timer driver.
//!
//! The machine clock only moves when someone advances it. The driver does so
//! from a tokio task: it sleeps until the next deadline, or until the machine
//! signals that its timers changed, then advances the clock to the elapsed
//! wall time.

use crate::core::Domain;
use crate::machine::Machine;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawn [`run`] on the current tokio runtime.
pub fn spawn<D: Domain>(machine: Machine<D>) -> JoinHandle<()> {
    tokio::spawn(run(machine))
}

/// Keeps the machine on wall time while the driver runs.
struct WallClock<'a, D: Domain>(&'a Machine<D>);

impl<D: Domain> Drop for WallClock<'_, D> {
    fn drop(&mut self) {
        self.0.detach_wall_clock();
    }
}

/// Drive the machine's clock until it shuts down.
///
/// While this runs, every external event or command first brings the clock
/// up to wall time.
pub async fn run<D: Domain>(machine: Machine<D>) {
    let start = machine.attach_wall_clock();
    let _attached = WallClock(&machine);
    debug!(machine = machine.name(), "timer driver started");

    loop {
        if machine.is_shut_down() {
            break;
        }

        let woken = machine.wakeup().notified();
        match machine.next_deadline() {
            Some(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(start + deadline) => {}
                    _ = woken => {}
                }
            }
            None => woken.await,
        }

        if machine.advance_to(start.elapsed()).is_err() {
            break;
        }
    }

    debug!(machine = machine.name(), "timer driver stopped");
}
