//! Schedule building: where a vehicle can take new work, what serving a
//! request would look like, and the task chains written into schedules.
//!
//! # Eligibility and departure
//!
//! | Schedule state                          | Departure (node, time)                     |
//! |-----------------------------------------|--------------------------------------------|
//! | `Unplanned`                             | start node, `max(now, t0)`                 |
//! | last task is a wait-stay                | wait node, `max(now, wait.begin)`          |
//! | current + last task is a cruise, both flags | diversion point                        |
//! | current + last task is a cruise, no destination | cruise end node, cruise end        |
//!
//! Anything else carries a passenger commitment and is not eligible, which is
//! what holds every vehicle to one passenger at a time.
//!
//! # Trip chain
//!
//! ```text
//! [drive-to-pickup] pickup-stay [drive-to-dropoff] dropoff-stay
//! ```
//!
//! Drives whose origin equals their destination are left out.  The pickup
//! stay begins on arrival and ends `pickup_duration` after `max(arrival, t0)`.

use std::sync::Arc;

use tracing::{debug, warn};

use dvrp_core::{NodeId, RequestId, SimTime, VehicleId};
use dvrp_fleet::Request;
use dvrp_schedule::{DiversionPolicy, DrivePurpose, Schedule, ScheduleError, ScheduleStatus, StayPurpose, Task};
use dvrp_spatial::{PathCache, PathCostOracle, Route, Router, SpatialResult};

use crate::config::DispatchConfig;
use crate::error::{DispatchError, DispatchResult};

// ── Departure ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DepartureKind {
    /// Nothing planned yet.
    Idle,
    /// After cutting (or replacing) the trailing wait-stay at `index`.
    Wait { index: usize, current: bool },
    /// From the diversion point of the cruise in progress.
    Divert,
    /// After the cruise in progress ends.
    AfterCruise,
}

/// Where and when a vehicle can start new work.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Departure {
    pub node: NodeId,
    pub time: SimTime,
    pub kind: DepartureKind,
}

// ── Candidate ─────────────────────────────────────────────────────────────────

/// One scored (vehicle, request) pairing.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub vehicle:        VehicleId,
    pub request:        RequestId,
    /// The request's earliest pickup time.
    pub t0:             SimTime,
    pub departure:      Departure,
    pub to_pickup:      Arc<Route>,
    pub pickup_arrival: SimTime,
    pub pickup_end:     SimTime,
    /// `None` while the destination is unknown.
    pub to_dropoff:     Option<Arc<Route>>,
}

impl Candidate {
    pub fn wait_secs(&self) -> u64 {
        self.pickup_arrival.max(self.t0).since(self.t0)
    }
}

/// What a successful commit did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    pub pickup_at:   SimTime,
    /// Node at which a cruise was cut, if the vehicle was diverted.
    pub diverted_at: Option<NodeId>,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
pub struct Scheduler {
    policy:       DiversionPolicy,
    pickup_secs:  u64,
    dropoff_secs: u64,
}

impl Scheduler {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            policy:       config.policy(),
            pickup_secs:  config.pickup_duration_secs,
            dropoff_secs: config.dropoff_duration_secs,
        }
    }

    pub fn policy(&self) -> DiversionPolicy {
        self.policy
    }

    /// Where `schedule`'s vehicle could start new work, or `None` if it is
    /// busy, off shift or completed.
    pub fn departure(&self, schedule: &Schedule, now: SimTime) -> Option<Departure> {
        if now >= schedule.t1() {
            return None;
        }
        match schedule.status() {
            ScheduleStatus::Completed => return None,
            ScheduleStatus::Unplanned => {
                return Some(Departure {
                    node: schedule.start_node(),
                    time: now.max(schedule.t0()),
                    kind: DepartureKind::Idle,
                });
            }
            ScheduleStatus::Planned | ScheduleStatus::Started => {}
        }

        let last = schedule.last_task()?;
        let index = schedule.task_count() - 1;
        let current = schedule.current_index() == Some(index);
        if last.is_wait() {
            return Some(Departure {
                node: last.end_node(),
                time: now.max(last.begin),
                kind: DepartureKind::Wait { index, current },
            });
        }
        if !(last.is_cruise() && current && self.policy.diversion_allowed) {
            return None;
        }
        if self.policy.allows_diversion() {
            let point = schedule.diversion_point(now, self.policy).ok()?;
            Some(Departure { node: point.node, time: point.time, kind: DepartureKind::Divert })
        } else {
            Some(Departure { node: last.end_node(), time: last.end, kind: DepartureKind::AfterCruise })
        }
    }

    /// Route `departure` to `request` and project the pickup.
    ///
    /// `NoPath` for either leg makes the pairing infeasible.
    pub fn evaluate<R: Router>(
        &self,
        cache: &mut PathCache,
        oracle: &PathCostOracle<R>,
        vehicle: VehicleId,
        departure: Departure,
        request: &Request,
    ) -> SpatialResult<Candidate> {
        let to_pickup = cache.get(oracle, departure.node, request.from, departure.time)?;
        let pickup_arrival = departure.time + to_pickup.travel_time_secs;
        let pickup_end = pickup_arrival.max(request.t0) + self.pickup_secs;
        let to_dropoff = match self.policy.destination_known {
            true => Some(cache.get(oracle, request.from, request.to, pickup_end)?),
            false => None,
        };
        Ok(Candidate {
            vehicle,
            request: request.id,
            t0: request.t0,
            departure,
            to_pickup,
            pickup_arrival,
            pickup_end,
            to_dropoff,
        })
    }

    /// Write `candidate`'s trip into `schedule`.
    pub fn commit<R: Router>(
        &self,
        cache: &mut PathCache,
        oracle: &PathCostOracle<R>,
        schedule: &mut Schedule,
        candidate: &Candidate,
        request: &Request,
        now: SimTime,
    ) -> DispatchResult<CommitOutcome> {
        if candidate.departure.kind == DepartureKind::Divert {
            return self.commit_diversion(cache, oracle, schedule, candidate, request, now);
        }
        self.place(schedule, candidate.departure, self.trip_tasks(candidate, request))?;
        Ok(CommitOutcome { pickup_at: candidate.pickup_arrival, diverted_at: None })
    }

    fn commit_diversion<R: Router>(
        &self,
        cache: &mut PathCache,
        oracle: &PathCostOracle<R>,
        schedule: &mut Schedule,
        candidate: &Candidate,
        request: &Request,
        now: SimTime,
    ) -> DispatchResult<CommitOutcome> {
        let Some(cruise) = schedule.last_task().cloned() else {
            return Err(inconsistent(schedule.vehicle(), "diverting an empty schedule"));
        };
        let diverted = schedule.divert_current_task(
            Arc::clone(&candidate.to_pickup),
            DrivePurpose::ToPickup(candidate.request),
            now,
            self.policy,
        );
        match diverted {
            Ok(_) => {}
            Err(ScheduleError::DiversionNotAllowed { reason, .. }) => {
                warn!(
                    vehicle = %candidate.vehicle,
                    request = %candidate.request,
                    reason,
                    "diversion refused, appending after the cruise",
                );
                let departure = Departure {
                    node: cruise.end_node(),
                    time: cruise.end,
                    kind: DepartureKind::AfterCruise,
                };
                let fallback = self.evaluate(cache, oracle, candidate.vehicle, departure, request)?;
                return self.commit(cache, oracle, schedule, &fallback, request, now);
            }
            Err(e) => return Err(e.into()),
        }

        // The drive to the pickup is in place; add the rest of the trip.
        let skip = usize::from(!candidate.to_pickup.is_trivial());
        for task in self.trip_tasks(candidate, request).into_iter().skip(skip) {
            schedule.append_task(task)?;
        }
        self.resume_cruise(cache, oracle, schedule, cruise.end_node())?;
        Ok(CommitOutcome { pickup_at: candidate.pickup_arrival, diverted_at: Some(candidate.departure.node) })
    }

    /// Append a cruise from the end of `schedule` back to `target`.  Skipped
    /// when already there or when `target` cannot be reached.
    fn resume_cruise<R: Router>(
        &self,
        cache: &mut PathCache,
        oracle: &PathCostOracle<R>,
        schedule: &mut Schedule,
        target: NodeId,
    ) -> DispatchResult<()> {
        let (from, begin) = (schedule.end_node(), schedule.end_time());
        if from == target {
            return Ok(());
        }
        match cache.get(oracle, from, target, begin) {
            Ok(path) => schedule.append_task(Task::drive(DrivePurpose::Cruise, path, begin))?,
            Err(e) => debug!(vehicle = %schedule.vehicle(), error = %e, "cruise not resumed"),
        }
        Ok(())
    }

    /// Plan the drive to the destination once the passenger is on board.
    ///
    /// Replaces the wait-stay that ending the pickup appended, if any.
    pub fn append_dropoff_leg<R: Router>(
        &self,
        cache: &mut PathCache,
        oracle: &PathCostOracle<R>,
        schedule: &mut Schedule,
        request: &Request,
    ) -> DispatchResult<()> {
        let from = schedule.first_planned_index();
        let Some(pickup) = from.checked_sub(1).and_then(|i| schedule.tasks().get(i)) else {
            return Err(inconsistent(schedule.vehicle(), "no performed pickup to continue from"));
        };
        let (node, begin) = (pickup.end_node(), pickup.end);
        let path = cache.get(oracle, node, request.to, begin)?;
        schedule.replace_tail(from, self.dropoff_tasks(request.id, &path, request.to, begin))?;
        Ok(())
    }

    /// Take `request` out of `schedule` and close the gap.
    ///
    /// A drive to its pickup already under way is cut at the next node.
    /// Whatever followed the removed tasks is rejoined at the cut.
    pub fn cancel<R: Router>(
        &self,
        cache: &mut PathCache,
        oracle: &PathCostOracle<R>,
        schedule: &mut Schedule,
        request: RequestId,
        now: SimTime,
    ) -> DispatchResult<()> {
        let Some(first) = schedule.task_index_of(request) else {
            return Ok(());
        };
        let tasks = schedule.tasks();
        let block_end = tasks[first..]
            .iter()
            .position(|t| t.request() != Some(request))
            .map_or(tasks.len(), |k| first + k);
        let rest = tasks[block_end..].to_vec();

        let (cut_from, anchor) = if schedule.current_index() == Some(first) {
            let forced = DiversionPolicy { destination_known: true, diversion_allowed: true };
            let point = schedule.diversion_point(now, forced)?;
            schedule.divert_current_task(Arc::new(Route::trivial(point.node)), DrivePurpose::Cruise, now, forced)?;
            (first + 1, (point.time, point.node))
        } else if first == 0 {
            (0, (schedule.t0(), schedule.start_node()))
        } else {
            let before = &tasks[first - 1];
            (first, (before.end, before.end_node()))
        };

        let tail = match (rest.is_empty(), cut_from) {
            (true, 0) => Vec::new(),
            _ => self.rejoin(cache, oracle, schedule, anchor, rest),
        };
        schedule.replace_tail(cut_from, tail)?;
        debug!(vehicle = %schedule.vehicle(), %request, at = %now, "request removed from schedule");
        Ok(())
    }

    /// Tasks that continue from `anchor` into `rest`, keeping later times
    /// where possible.
    ///
    /// A leading empty cruise is routed again from the anchor to its
    /// destination.
    fn rejoin<R: Router>(
        &self,
        cache: &mut PathCache,
        oracle: &PathCostOracle<R>,
        schedule: &Schedule,
        (mut time, mut node): (SimTime, NodeId),
        mut rest: Vec<Task>,
    ) -> Vec<Task> {
        let mut tail = Vec::with_capacity(rest.len() + 2);
        if let Some(target) = rest.first().filter(|t| t.is_cruise()).map(Task::end_node) {
            match cache.get(oracle, node, target, time) {
                Ok(path) => {
                    rest.remove(0);
                    if !path.is_trivial() {
                        let cruise = Task::drive(DrivePurpose::Cruise, path, time);
                        (time, node) = (cruise.end, target);
                        tail.push(cruise);
                    }
                }
                Err(e) => debug!(vehicle = %schedule.vehicle(), error = %e, "cruise not re-routed, bridging"),
            }
        }
        let Some(next) = rest.first() else {
            return match tail.is_empty() {
                true => idle_until_shift_end(schedule, time, node),
                false => tail,
            };
        };
        let (next_begin, next_node) = (next.begin, next.begin_node());

        let mut arrival = time;
        if next_node != node {
            match cache.get(oracle, node, next_node, time) {
                Ok(path) => {
                    let bridge = Task::drive(DrivePurpose::Cruise, path, time);
                    arrival = bridge.end;
                    tail.push(bridge);
                }
                Err(e) => {
                    warn!(vehicle = %schedule.vehicle(), error = %e, "cannot bridge to remaining tasks, dropping them");
                    if tail.is_empty() {
                        return idle_until_shift_end(schedule, time, node);
                    }
                    return tail;
                }
            }
        }
        if arrival <= next_begin {
            if arrival < next_begin {
                tail.push(Task::wait(next_node, arrival, next_begin));
            }
            tail.extend(rest);
        } else {
            let delay = arrival.since(next_begin);
            tail.extend(rest.iter().map(|t| t.shifted(delay)));
        }
        tail
    }

    /// Send an eligible vehicle empty to `to`.
    pub fn reposition<R: Router>(
        &self,
        cache: &mut PathCache,
        oracle: &PathCostOracle<R>,
        schedule: &mut Schedule,
        departure: Departure,
        to: NodeId,
        now: SimTime,
    ) -> DispatchResult<()> {
        let path = cache.get(oracle, departure.node, to, departure.time)?;
        if departure.kind == DepartureKind::Divert {
            schedule.divert_current_task(path, DrivePurpose::Cruise, now, self.policy)?;
            return Ok(());
        }
        if path.is_trivial() {
            return Ok(());
        }
        self.place(schedule, departure, vec![Task::drive(DrivePurpose::Cruise, path, departure.time)])
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn trip_tasks(&self, c: &Candidate, request: &Request) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(4);
        if !c.to_pickup.is_trivial() {
            tasks.push(Task::drive(DrivePurpose::ToPickup(c.request), Arc::clone(&c.to_pickup), c.departure.time));
        }
        tasks.push(Task::stay(StayPurpose::Pickup(c.request), request.from, c.pickup_arrival, c.pickup_end));
        if let Some(path) = &c.to_dropoff {
            tasks.extend(self.dropoff_tasks(c.request, path, request.to, c.pickup_end));
        }
        tasks
    }

    fn dropoff_tasks(&self, request: RequestId, path: &Arc<Route>, to: NodeId, begin: SimTime) -> Vec<Task> {
        let arrival = begin + path.travel_time_secs;
        let mut tasks = Vec::with_capacity(2);
        if !path.is_trivial() {
            tasks.push(Task::drive(DrivePurpose::ToDropoff(request), Arc::clone(path), begin));
        }
        tasks.push(Task::stay(StayPurpose::Dropoff(request), to, arrival, arrival + self.dropoff_secs));
        tasks
    }

    /// Put `tasks`, which begin at `departure`, into `schedule`.
    fn place(&self, schedule: &mut Schedule, departure: Departure, tasks: Vec<Task>) -> DispatchResult<()> {
        match departure.kind {
            DepartureKind::Idle => {
                let chain = with_lead_in(departure, schedule.t0(), tasks);
                schedule.replace_tail(0, chain)?;
            }
            DepartureKind::Wait { current: true, .. } => {
                schedule.truncate_current_wait(departure.time)?;
                let end = schedule.task_count();
                schedule.replace_tail(end, tasks)?;
            }
            DepartureKind::Wait { index, current: false } => {
                let Some(wait) = schedule.tasks().get(index) else {
                    return Err(inconsistent(schedule.vehicle(), "trailing wait vanished"));
                };
                let chain = with_lead_in(departure, wait.begin, tasks);
                schedule.replace_tail(index, chain)?;
            }
            DepartureKind::AfterCruise => {
                let end = schedule.task_count();
                schedule.replace_tail(end, tasks)?;
            }
            DepartureKind::Divert => {
                return Err(inconsistent(schedule.vehicle(), "diversion cannot be placed as a chain"));
            }
        }
        Ok(())
    }
}

/// A wait at `node` from `time` to the end of the shift, if any is left.
fn idle_until_shift_end(schedule: &Schedule, time: SimTime, node: NodeId) -> Vec<Task> {
    match time < schedule.t1() {
        true => vec![Task::wait(node, time, schedule.t1())],
        false => Vec::new(),
    }
}

/// Prefix `tasks` with a wait at the departure node covering `[from, departure)`.
fn with_lead_in(departure: Departure, from: SimTime, tasks: Vec<Task>) -> Vec<Task> {
    let mut chain = Vec::with_capacity(tasks.len() + 1);
    if departure.time > from {
        chain.push(Task::wait(departure.node, from, departure.time));
    }
    chain.extend(tasks);
    chain
}

fn inconsistent(vehicle: VehicleId, reason: &str) -> DispatchError {
    DispatchError::Schedule(ScheduleError::Inconsistency { vehicle, reason: reason.into() })
}
