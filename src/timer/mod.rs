//! Timers owned by state activations.
//!
//! [`TimerService`] keeps the table and the machine clock. Due timers are
//! queued as ordinary work; nothing fires inline. [`driver`] runs the clock
//! against tokio time.

pub mod driver;
mod service;

pub use service::{
    PendingTimer, TimerCallback, TimerHandle, TimerKind, TimerOwner, TimerService, MIN_INTERVAL,
};

pub(crate) use service::owner_of;
