//! Cooperative timers with generational handles.
//!
//! The service never runs a callback by itself. `pop_due` hands out the
//! handle of the next due timer; the dispatcher queues it as ordinary work
//! and later asks the service for the callback. A handle whose slot
//! generation moved on in the meantime is stale and yields nothing.

use crate::core::{Domain, State};
use crate::region::HookCtx;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest interval a repeating timer may use.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Callback run when a timer fires, with the owning state's hook context.
pub type TimerCallback<D> = Box<dyn FnMut(&mut HookCtx<'_, D>) + Send>;

/// Generational reference to a scheduled timer.
///
/// Handles are cheap to copy. Once the timer is cancelled or a one-shot timer
/// has fired, the handle is permanently invalid even if its slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle {
    slot: usize,
    generation: u64,
}

impl TimerHandle {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Whether a timer fires once or keeps ticking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    Once,
    Repeating(Duration),
}

/// The (region, state) activation a timer belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct TimerOwner<S> {
    pub region: usize,
    pub state: S,
}

/// Read-only view of a live timer.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingTimer<S> {
    pub handle: TimerHandle,
    pub owner: TimerOwner<S>,
    pub deadline: Duration,
    pub kind: TimerKind,
}

struct ArmedTimer<D: Domain> {
    deadline: Duration,
    seq: u64,
    kind: TimerKind,
    owner: TimerOwner<D::State>,
    callback: Option<TimerCallback<D>>,
    // one-shot timer handed out by pop_due and not executed yet
    in_flight: bool,
}

struct Slot<D: Domain> {
    generation: u64,
    timer: Option<ArmedTimer<D>>,
}

/// Timer table driven by a machine-local monotonic clock.
pub struct TimerService<D: Domain> {
    now: Duration,
    seq: u64,
    slots: Vec<Slot<D>>,
    free: Vec<usize>,
}

impl<D: Domain> Default for TimerService<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Domain> TimerService<D> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            seq: 0,
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Current machine clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward. The clock never goes backwards.
    pub fn advance_clock(&mut self, to: Duration) {
        if to > self.now {
            self.now = to;
        }
    }

    pub(crate) fn schedule_once(
        &mut self,
        owner: TimerOwner<D::State>,
        delay: Duration,
        callback: TimerCallback<D>,
    ) -> TimerHandle {
        self.schedule(owner, delay, TimerKind::Once, callback)
    }

    /// Schedule a repeating timer whose first fire is `first` from now.
    pub(crate) fn schedule_repeating(
        &mut self,
        owner: TimerOwner<D::State>,
        first: Duration,
        interval: Duration,
        callback: TimerCallback<D>,
    ) -> TimerHandle {
        let interval = interval.max(MIN_INTERVAL);
        self.schedule(owner, first, TimerKind::Repeating(interval), callback)
    }

    fn schedule(
        &mut self,
        owner: TimerOwner<D::State>,
        delay: Duration,
        kind: TimerKind,
        callback: TimerCallback<D>,
    ) -> TimerHandle {
        let timer = ArmedTimer {
            deadline: self.now + delay,
            seq: self.next_seq(),
            kind,
            owner,
            callback: Some(callback),
            in_flight: false,
        };

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    timer: None,
                });
                self.slots.len() - 1
            }
        };
        self.slots[slot].timer = Some(timer);

        TimerHandle {
            slot,
            generation: self.slots[slot].generation,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Cancel a timer. Returns `false` if the handle was already stale.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        self.release(handle.slot);
        true
    }

    fn release(&mut self, slot: usize) {
        let entry = &mut self.slots[slot];
        entry.timer = None;
        entry.generation += 1;
        self.free.push(slot);
    }

    /// Cancel every timer owned by `state` in `region`.
    pub fn cancel_owned(&mut self, region: usize, state: &D::State) -> usize {
        let owned: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| {
                let timer = entry.timer.as_ref()?;
                (timer.owner.region == region && timer.owner.state == *state).then_some(slot)
            })
            .collect();
        for slot in &owned {
            self.release(*slot);
        }
        owned.len()
    }

    /// Cancel everything.
    pub fn cancel_all(&mut self) -> usize {
        let live: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.timer.as_ref().map(|_| slot))
            .collect();
        for slot in &live {
            self.release(*slot);
        }
        live.len()
    }

    /// Whether the handle still refers to a scheduled timer.
    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.slots
            .get(handle.slot)
            .is_some_and(|entry| entry.generation == handle.generation && entry.timer.is_some())
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|entry| entry.timer.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every live timer, in slot order.
    pub fn pending(&self) -> Vec<PendingTimer<D::State>> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| {
                let timer = entry.timer.as_ref()?;
                Some(PendingTimer {
                    handle: TimerHandle {
                        slot,
                        generation: entry.generation,
                    },
                    owner: timer.owner.clone(),
                    deadline: timer.deadline,
                    kind: timer.kind,
                })
            })
            .collect()
    }

    /// Earliest deadline among timers that have not been handed out yet.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.armed().map(|(_, timer)| timer.deadline).min()
    }

    fn armed(&self) -> impl Iterator<Item = (usize, &ArmedTimer<D>)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry
                .timer
                .as_ref()
                .filter(|timer| !timer.in_flight)
                .map(|timer| (slot, timer))
        })
    }

    /// Hand out the next timer due at or before `limit`.
    ///
    /// The clock moves to the timer's deadline. A repeating timer is re-armed
    /// one interval later; a one-shot timer stays live until it is executed
    /// or cancelled.
    pub fn pop_due(&mut self, limit: Duration) -> Option<TimerHandle> {
        let (slot, _) = self
            .armed()
            .filter(|(_, timer)| timer.deadline <= limit)
            .min_by_key(|(_, timer)| (timer.deadline, timer.seq))?;

        let seq = self.next_seq();
        let entry = &mut self.slots[slot];
        let timer = entry.timer.as_mut()?;
        let fired_at = timer.deadline;
        match timer.kind {
            TimerKind::Once => timer.in_flight = true,
            TimerKind::Repeating(interval) => {
                timer.deadline += interval;
                timer.seq = seq;
            }
        }
        let handle = TimerHandle {
            slot,
            generation: entry.generation,
        };
        self.advance_clock(fired_at);
        Some(handle)
    }

    /// Take the callback of a fired timer so it can run.
    ///
    /// Returns `None` for a stale handle.
    pub(crate) fn take_callback(
        &mut self,
        handle: TimerHandle,
    ) -> Option<(TimerCallback<D>, TimerOwner<D::State>)> {
        if !self.is_live(handle) {
            return None;
        }
        let timer = self.slots[handle.slot].timer.as_mut()?;
        let callback = timer.callback.take()?;
        Some((callback, timer.owner.clone()))
    }

    /// Return a callback after it ran.
    ///
    /// One-shot timers are retired. A repeating timer gets its callback back
    /// unless it was cancelled while running.
    pub(crate) fn restore_callback(&mut self, handle: TimerHandle, callback: TimerCallback<D>) {
        if !self.is_live(handle) {
            return;
        }
        let retire = match self.slots[handle.slot].timer.as_mut() {
            Some(timer) => match timer.kind {
                TimerKind::Once => true,
                TimerKind::Repeating(_) => {
                    timer.callback = Some(callback);
                    false
                }
            },
            None => false,
        };
        if retire {
            self.release(handle.slot);
        }
    }
}

impl<D: Domain> std::fmt::Debug for TimerService<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService")
            .field("now", &self.now)
            .field("live", &self.len())
            .finish()
    }
}

/// Owner helper used by hooks: timers belong to the state whose hook
/// scheduled them.
pub(crate) fn owner_of<S: State>(region: usize, state: &S) -> TimerOwner<S> {
    TimerOwner {
        region,
        state: state.clone(),
    }
}
