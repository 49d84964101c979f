//! The `Sim` struct and its tick loop.

use dvrp_core::{NodeId, RequestId, SimClock, SimConfig, SimTime, VehicleId};
use dvrp_dispatch::{DispatchError, DispatchEvent, Dispatcher};
use dvrp_fleet::{NewRequest, RequestStatus};
use dvrp_schedule::{ScheduleError, Task, WakeQueue};
use dvrp_spatial::{CacheStats, DijkstraRouter, Router};
use tracing::{debug, error, info, trace, warn};

use crate::{DemandFeed, SimObserver, SimResult};

// ── SimSummary ────────────────────────────────────────────────────────────────

/// Run totals, read from the request registry plus counters kept by the loop.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimSummary {
    pub ticks:          u64,
    pub cycles:         u64,
    pub submitted:      usize,
    /// Due requests the optimizer refused to register.
    pub dropped:        u64,
    pub completed:      usize,
    pub rejected:       usize,
    pub withdrawn:      usize,
    /// Submitted and not yet in a terminal status.
    pub open:           usize,
    pub diversions:     u64,
    /// Mean of pickup time minus earliest pickup time, over picked-up
    /// requests.
    pub mean_wait_secs: Option<f64>,
    pub cache:          CacheStats,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The reference tick adapter.
///
/// `Sim<R>` owns a [`Dispatcher`] and drives it with a fixed-step clock:
///
/// 1. **Demand**: requests whose submission time has come are handed to the
///    optimizer.
/// 2. **Wake**: vehicles whose current task ends (or whose next task begins)
///    at or before `now` are drained from the wake queue and advanced task by
///    task.  A vehicle that starts its trailing wait is reported idle.
/// 3. **Optimize**: [`Dispatcher::on_tick`] runs a cycle if its trigger fires.
/// 4. **Touched**: vehicles whose schedules changed are advanced again so
///    anything the optimizer planned to start at `now` starts this tick.
/// 5. **Publish**: dispatch events are forwarded to the observer.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<R: Router = DijkstraRouter> {
    /// Run configuration (start time, tick length, total ticks, seed).
    pub config: SimConfig,

    /// Simulation clock.
    pub clock: SimClock,

    pub(crate) dispatcher: Dispatcher<R>,

    /// Requests not yet submitted.
    pub(crate) demand: DemandFeed,

    /// The full demand as built, restored by [`Sim::reset`].
    pub(crate) requests: Vec<NewRequest>,

    /// Task boundary times per vehicle.
    pub(crate) wake_queue: WakeQueue,

    pub(crate) cycles:     u64,
    pub(crate) diversions: u64,
    pub(crate) dropped:    u64,
}

impl<R: Router> Sim<R> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_time()`.
    ///
    /// Use [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let end = self.config.end_time();
        info!(start = %self.clock.now(), end = %end, vehicles = self.dispatcher.fleet().len(), "run started");
        while self.clock.now() < end {
            self.step(observer)?;
        }
        let summary = self.summary();
        info!(
            completed = summary.completed,
            rejected = summary.rejected,
            open = summary.open,
            cycles = summary.cycles,
            "run finished",
        );
        observer.on_sim_end(self.clock.now(), &summary);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores the end
    /// time).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn dispatcher(&self) -> &Dispatcher<R> {
        &self.dispatcher
    }

    /// The task `vehicle` is executing at the current tick.
    ///
    /// A schedule that does not cover the current tick is an error in debug
    /// builds.  Release builds log it and report no task.
    pub fn current_task(&self, vehicle: VehicleId) -> SimResult<Option<&Task>> {
        let now = self.clock.now();
        match self.dispatcher.current_task(vehicle, now) {
            Ok(task) => Ok(task),
            Err(DispatchError::Schedule(e @ ScheduleError::Inconsistency { .. })) if !cfg!(debug_assertions) => {
                warn!(%vehicle, at = %now, error = %e, "schedule inconsistency skipped");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Queue a request; it reaches the optimizer on the first tick at or
    /// after its submission time.
    pub fn submit(&mut self, request: NewRequest) {
        self.demand.push(request);
    }

    /// Cancel a request now and replan the vehicle it was assigned to.
    pub fn withdraw(&mut self, request: RequestId) -> SimResult<()> {
        let now = self.clock.now();
        self.dispatcher.withdraw_request(request, now)?;
        self.advance_touched(now)
    }

    /// Send an eligible vehicle empty to `node` now.
    pub fn reposition(&mut self, vehicle: VehicleId, node: NodeId) -> SimResult<()> {
        let now = self.clock.now();
        self.dispatcher.reposition(vehicle, node, now)?;
        self.advance_touched(now)
    }

    /// Totals as of the current tick.
    pub fn summary(&self) -> SimSummary {
        let registry = self.dispatcher.registry();
        let waits: Vec<u64> = registry.iter().filter_map(|r| r.wait_secs()).collect();
        let mean_wait_secs = if waits.is_empty() {
            None
        } else {
            Some(waits.iter().sum::<u64>() as f64 / waits.len() as f64)
        };
        SimSummary {
            ticks:      self.clock.ticks_elapsed,
            cycles:     self.cycles,
            submitted:  registry.len(),
            dropped:    self.dropped,
            completed:  registry.count(RequestStatus::Completed),
            rejected:   registry.count(RequestStatus::Rejected),
            withdrawn:  registry.count(RequestStatus::Withdrawn),
            open:       registry.iter().filter(|r| !r.status().is_terminal()).count(),
            diversions: self.diversions,
            mean_wait_secs,
            cache:      self.dispatcher.cache_stats(),
        }
    }

    /// Rewind to tick 0 with the original demand, for a repeated run.
    pub fn reset(&mut self) {
        self.clock = self.config.make_clock();
        self.dispatcher.reset();
        self.demand = DemandFeed::new(self.requests.clone());
        self.wake_queue.clear();
        self.cycles = 0;
        self.diversions = 0;
        self.dropped = 0;
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.clock.now();
        observer.on_tick_start(now);
        match self.process_tick(now, observer) {
            Ok(woken) => observer.on_tick_end(now, woken),
            Err(e) => {
                error!(at = %now, error = %e, "run aborted");
                return Err(e);
            }
        }
        self.clock.advance();
        Ok(())
    }

    fn process_tick<O: SimObserver>(&mut self, now: SimTime, observer: &mut O) -> SimResult<usize> {
        // ── Demand ────────────────────────────────────────────────────────
        for spec in self.demand.pop_due(now) {
            match self.dispatcher.on_request_submitted(spec) {
                Ok(id) => trace!(request = %id, from = %spec.from, to = %spec.to, "submitted"),
                Err(e) => {
                    warn!(error = %e, ?spec, "request dropped");
                    self.dropped += 1;
                    observer.on_request_dropped(&spec, &e);
                }
            }
        }

        // ── Wake ──────────────────────────────────────────────────────────
        let woken = self.wake_queue.drain_due(now);
        let woken_count = woken.len();
        for vehicle in woken {
            self.advance(vehicle, now)?;
        }

        // ── Optimize ──────────────────────────────────────────────────────
        if let Some(report) = self.dispatcher.on_tick(now)? {
            self.cycles += 1;
            if report.mode.is_some() {
                debug!(at = %now, ?report, "cycle");
            }
            observer.on_cycle(now, &report);
        }

        // ── Touched ───────────────────────────────────────────────────────
        self.advance_touched(now)?;

        // ── Publish ───────────────────────────────────────────────────────
        for event in self.dispatcher.drain_events() {
            if matches!(event, DispatchEvent::VehicleDiverted { .. }) {
                self.diversions += 1;
            }
            observer.on_event(&event);
        }

        Ok(woken_count)
    }

    fn advance_touched(&mut self, now: SimTime) -> SimResult<()> {
        loop {
            let touched = self.dispatcher.take_touched_vehicles();
            if touched.is_empty() {
                return Ok(());
            }
            for vehicle in touched {
                self.advance(vehicle, now)?;
            }
        }
    }

    /// End and start `vehicle`'s tasks until its execution pointer catches
    /// up with `now`, then queue its next boundary.  Tasks change at their
    /// own scheduled times, not at the tick.
    fn advance(&mut self, vehicle: VehicleId, now: SimTime) -> SimResult<()> {
        loop {
            let schedule = self.dispatcher.fleet().get(vehicle)?.schedule();
            if let Some(task) = schedule.current() {
                if task.end > now {
                    self.wake_queue.push(task.end, vehicle);
                    return Ok(());
                }
                let end = task.end;
                self.dispatcher.on_task_completed(vehicle, end)?;
            } else if let Some(task) = schedule.next_task() {
                if task.begin > now {
                    self.wake_queue.push(task.begin, vehicle);
                    return Ok(());
                }
                let begin = task.begin;
                let started = self.dispatcher.on_task_started(vehicle, begin)?;
                let schedule = self.dispatcher.fleet().get(vehicle)?.schedule();
                let trailing = schedule.current_index() == Some(schedule.task_count() - 1);
                if started.is_wait() && trailing {
                    self.dispatcher.on_vehicle_idle(vehicle)?;
                }
            } else {
                return Ok(());
            }
        }
    }
}
