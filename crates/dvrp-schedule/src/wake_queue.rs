//! `WakeQueue`: sparse per-time vehicle activation queue.
//!
//! Most vehicles spend most ticks in the middle of a task.  Iterating the
//! whole fleet every tick to ask "did your task just end?" costs O(N) per
//! tick regardless of how many vehicles actually change state.
//!
//! Instead, whenever a task starts, the tick adapter registers the time at
//! which that task ends.  Each tick it drains only the vehicles due by then.
//!
//! A vehicle is queued at most once per time.  Schedules can change after a
//! vehicle was queued (diversion, cancellation), so entries are hints:
//! callers re-check the schedule when they drain one.

use std::collections::{BTreeMap, BTreeSet};

use dvrp_core::{SimTime, VehicleId};

#[derive(Default)]
pub struct WakeQueue {
    inner: BTreeMap<SimTime, Vec<VehicleId>>,
    total: usize,
}

impl WakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `vehicle` to wake at `time`.  Returns `false` if it was already
    /// queued for exactly that time.
    pub fn push(&mut self, time: SimTime, vehicle: VehicleId) -> bool {
        let slot = self.inner.entry(time).or_default();
        if slot.contains(&vehicle) {
            return false;
        }
        slot.push(vehicle);
        self.total += 1;
        true
    }

    /// Remove and return every vehicle queued at or before `now`, earliest
    /// time first, each vehicle once.
    pub fn drain_due(&mut self, now: SimTime) -> Vec<VehicleId> {
        let later = match now.0.checked_add(1) {
            Some(next) => self.inner.split_off(&SimTime(next)),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.inner, later);

        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for (_, vehicles) in due {
            self.total -= vehicles.len();
            out.extend(vehicles.into_iter().filter(|v| seen.insert(*v)));
        }
        out
    }

    /// The earliest queued time, or `None` if empty.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    /// Total number of (time, vehicle) entries.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.total = 0;
    }
}
