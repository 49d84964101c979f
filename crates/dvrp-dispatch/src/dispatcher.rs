//! `Dispatcher`: the online dispatch optimizer and its event API.
//!
//! # Cycle
//!
//! ```text
//! Idle → Collecting → CandidateSelection → Scoring → Assignment → Commit → Idle
//! ```
//!
//! *Collecting* gathers eligible vehicles (with their departures) and the
//! unplanned requests.  When requests outnumber vehicles the cycle is
//! vehicle-initiated: each vehicle, in id order, takes the best of its
//! nearest requests.  Otherwise each request, in arrival order, takes the
//! best of its nearest vehicles.  A vehicle or request is used at most once
//! per cycle.
//!
//! A request whose candidates were all unreachable fails the cycle; after
//! `retry_budget` failed cycles it is rejected.  Per-request failures never
//! abort the cycle.  A broken schedule invariant during commit does, with a
//! dump of the offending schedule.
//!
//! # Ownership
//!
//! The dispatcher owns the fleet, the request registry, the path cache and
//! the oracle for one run.  The tick adapter drives execution through
//! [`Dispatcher::on_task_started`] / [`Dispatcher::on_task_completed`] and
//! reads schedules through [`Dispatcher::fleet`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, debug_span, error, info, trace, warn};

use dvrp_core::{NodeId, RequestId, SimTime, VehicleId};
use dvrp_fleet::{Fleet, NewRequest, Request, RequestRegistry, RequestStatus};
use dvrp_schedule::{StayPurpose, Task, TaskKind};
use dvrp_spatial::{CacheStats, DijkstraRouter, PathCache, PathCostOracle, RoadNetwork, Router, SpatialError};

use crate::config::{DispatchConfig, OptimizationTrigger};
use crate::error::{is_fatal_schedule_error, DispatchError, DispatchResult};
use crate::event::DispatchEvent;
use crate::filter::CandidateFilter;
use crate::objective::{objective_for, Objective};
use crate::scheduler::{Candidate, Departure, Scheduler};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CyclePhase {
    Idle,
    Collecting,
    CandidateSelection,
    Scoring,
    Assignment,
    Commit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CycleMode {
    RequestInitiated,
    VehicleInitiated,
}

/// Summary of one optimization cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleReport {
    /// `None` when there was nothing to match.
    pub mode:               Option<CycleMode>,
    pub eligible_vehicles:  usize,
    pub unplanned_requests: usize,
    pub assigned:           usize,
    /// Requests whose every candidate was unreachable this cycle.
    pub failed:             usize,
    pub rejected:           usize,
}

/// Best candidate of a scoring round.
#[derive(Default)]
struct Scoring {
    best:      Option<(f64, Candidate)>,
    scored:    usize,
    reachable: usize,
}

impl Scoring {
    fn offer(&mut self, score: f64, candidate: Candidate) {
        self.reachable += 1;
        if self.best.as_ref().is_none_or(|(best, _)| score < *best) {
            self.best = Some((score, candidate));
        }
    }

    fn all_unreachable(&self) -> bool {
        self.scored > 0 && self.reachable == 0
    }
}

pub struct Dispatcher<R: Router = DijkstraRouter> {
    config:    DispatchConfig,
    scheduler: Scheduler,
    objective: Box<dyn Objective>,
    oracle:    PathCostOracle<R>,
    cache:     PathCache,
    fleet:     Fleet,
    registry:  RequestRegistry,
    events:    Vec<DispatchEvent>,
    touched:   BTreeSet<VehicleId>,
    phase:     CyclePhase,
    ticks:     u64,
    /// Something happened that an `OnEvents` trigger reacts to.
    pending:   bool,
    now:       SimTime,
}

impl<R: Router> Dispatcher<R> {
    /// Validate `config` and take ownership of a fleet for a new run.  Every
    /// schedule is reset.
    pub fn new(config: DispatchConfig, oracle: PathCostOracle<R>, mut fleet: Fleet) -> DispatchResult<Self> {
        config.validate()?;
        fleet.reset_schedules();
        info!(
            vehicles = fleet.len(),
            nodes = oracle.network().node_count(),
            objective = ?config.objective,
            diversion = config.diversion_allowed,
            destination_known = config.destination_known,
            "dispatcher ready",
        );
        Ok(Self {
            scheduler: Scheduler::new(&config),
            objective: objective_for(config.objective),
            cache: PathCache::new(config.discretizer()),
            config,
            oracle,
            fleet,
            registry: RequestRegistry::new(),
            events: Vec::new(),
            touched: BTreeSet::new(),
            phase: CyclePhase::Idle,
            ticks: 0,
            pending: false,
            now: SimTime::ZERO,
        })
    }

    /// Replace the objective chosen by the config.
    pub fn with_objective(mut self, objective: Box<dyn Objective>) -> Self {
        self.objective = objective;
        self
    }

    /// Start a new run on the same fleet and network.
    pub fn reset(&mut self) {
        self.cache.reset();
        self.fleet.reset_schedules();
        self.registry = RequestRegistry::new();
        self.events.clear();
        self.touched.clear();
        self.phase = CyclePhase::Idle;
        self.ticks = 0;
        self.pending = false;
        self.now = SimTime::ZERO;
        info!("dispatcher reset");
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn config(&self) -> &DispatchConfig { &self.config }
    pub fn fleet(&self) -> &Fleet { &self.fleet }
    pub fn registry(&self) -> &RequestRegistry { &self.registry }
    pub fn network(&self) -> &RoadNetwork { self.oracle.network() }
    pub fn cache_stats(&self) -> CacheStats { self.cache.stats() }
    pub fn phase(&self) -> CyclePhase { self.phase }
    pub fn objective_name(&self) -> &'static str { self.objective.name() }

    /// The task `vehicle` is on at `time`.
    pub fn current_task(&self, vehicle: VehicleId, time: SimTime) -> DispatchResult<Option<&Task>> {
        Ok(self.fleet.get(vehicle)?.schedule().current_task(time)?)
    }

    // ── Adapter → optimizer ───────────────────────────────────────────────────

    pub fn on_request_submitted(&mut self, spec: NewRequest) -> DispatchResult<RequestId> {
        for node in [spec.from, spec.to] {
            if !self.network().contains(node) {
                return Err(SpatialError::NodeNotFound(node).into());
            }
        }
        self.pending = true;
        Ok(self.registry.submit(spec))
    }

    pub fn on_vehicle_idle(&mut self, vehicle: VehicleId) -> DispatchResult<()> {
        self.fleet.get(vehicle)?;
        self.events.push(DispatchEvent::VehicleIdle { vehicle, at: self.now });
        self.pending = true;
        Ok(())
    }

    /// Run a cycle if the trigger says so.
    pub fn on_tick(&mut self, now: SimTime) -> DispatchResult<Option<CycleReport>> {
        self.now = now;
        self.ticks += 1;
        let due = match self.config.trigger {
            OptimizationTrigger::EveryTick => true,
            OptimizationTrigger::EveryNTicks(n) => (self.ticks - 1) % u64::from(n) == 0,
            OptimizationTrigger::OnEvents => self.pending,
        };
        if !due {
            return Ok(None);
        }
        self.pending = false;
        self.run_cycle(now).map(Some)
    }

    /// Start `vehicle`'s next task and update the request it serves.
    pub fn on_task_started(&mut self, vehicle: VehicleId, now: SimTime) -> DispatchResult<Task> {
        self.now = now;
        let started = self.fleet.get_mut(vehicle)?.schedule_mut().start_next_task(now).cloned();
        let task = started.map_err(|e| self.escalate(vehicle, None, e.into()))?;
        match task.kind {
            TaskKind::Stay { purpose: StayPurpose::Pickup(request), .. } => {
                self.registry.begin_pickup(request, now)?;
                self.events.push(DispatchEvent::PickupStarted { request, vehicle, at: now });
            }
            TaskKind::Stay { purpose: StayPurpose::Dropoff(request), .. } => {
                self.registry.transition(request, RequestStatus::Dropoff)?;
                self.events.push(DispatchEvent::DropoffStarted { request, vehicle, at: now });
            }
            _ => {}
        }
        trace!(%vehicle, %task, "task started");
        Ok(task)
    }

    /// End `vehicle`'s current task and update the request it served.
    pub fn on_task_completed(&mut self, vehicle: VehicleId, now: SimTime) -> DispatchResult<Task> {
        self.now = now;
        let ended = self.fleet.get_mut(vehicle)?.schedule_mut().end_current_task(now);
        let task = ended.map_err(|e| self.escalate(vehicle, None, e.into()))?;
        match task.kind {
            TaskKind::Stay { purpose: StayPurpose::Pickup(request), .. } => {
                self.registry.transition(request, RequestStatus::OnBoard)?;
                self.events.push(DispatchEvent::PassengerOnBoard { request, vehicle, at: now });
                if !self.config.destination_known {
                    self.plan_dropoff(vehicle, request)?;
                }
            }
            TaskKind::Stay { purpose: StayPurpose::Dropoff(request), .. } => {
                self.registry.complete(request, now)?;
                self.events.push(DispatchEvent::RequestCompleted { request, vehicle, at: now });
                debug!(%vehicle, %request, at = %now, "request completed");
            }
            _ => {}
        }
        trace!(%vehicle, %task, "task completed");
        Ok(task)
    }

    /// Cancel a request that has not been picked up yet.
    pub fn withdraw_request(&mut self, request: RequestId, now: SimTime) -> DispatchResult<()> {
        self.now = now;
        let (status, vehicle) = {
            let r = self.registry.get(request)?;
            (r.status(), r.vehicle())
        };
        match (status, vehicle) {
            (RequestStatus::Unplanned, _) => {}
            (RequestStatus::Planned, Some(vehicle)) => {
                let v = self.fleet.get_mut(vehicle)?;
                let cancelled = self.scheduler.cancel(&mut self.cache, &self.oracle, v.schedule_mut(), request, now);
                cancelled.map_err(|e| self.escalate(vehicle, Some(request), e))?;
                self.touched.insert(vehicle);
            }
            (status, _) => return Err(DispatchError::NotWithdrawable { request, status }),
        }
        self.registry.transition(request, RequestStatus::Withdrawn)?;
        self.events.push(DispatchEvent::RequestWithdrawn { request, at: now });
        self.pending = true;
        debug!(%request, at = %now, "request withdrawn");
        Ok(())
    }

    /// Send an eligible vehicle empty to `node`.
    pub fn reposition(&mut self, vehicle: VehicleId, node: NodeId, now: SimTime) -> DispatchResult<()> {
        self.now = now;
        if !self.network().contains(node) {
            return Err(SpatialError::NodeNotFound(node).into());
        }
        let v = self.fleet.get_mut(vehicle)?;
        let Some(departure) = self.scheduler.departure(v.schedule(), now) else {
            return Err(DispatchError::NotEligible { vehicle, reason: "busy, off shift or completed" });
        };
        let moved = self.scheduler.reposition(&mut self.cache, &self.oracle, v.schedule_mut(), departure, node, now);
        moved.map_err(|e| self.escalate(vehicle, None, e))?;
        self.touched.insert(vehicle);
        self.events.push(DispatchEvent::VehicleRepositioned { vehicle, to: node, at: now });
        Ok(())
    }

    // ── Optimizer → adapter ───────────────────────────────────────────────────

    pub fn drain_events(&mut self) -> Vec<DispatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Vehicles whose schedules the optimizer changed since the last call, in
    /// id order.
    pub fn take_touched_vehicles(&mut self) -> Vec<VehicleId> {
        std::mem::take(&mut self.touched).into_iter().collect()
    }

    // ── Cycle ─────────────────────────────────────────────────────────────────

    /// Run one optimization cycle now, regardless of the trigger.
    pub fn run_cycle(&mut self, now: SimTime) -> DispatchResult<CycleReport> {
        let span = debug_span!("dispatch_cycle", now = %now);
        let _enter = span.enter();
        self.now = now;

        self.enter(CyclePhase::Collecting);
        let eligible: Vec<(VehicleId, Departure)> = self
            .fleet
            .iter()
            .filter_map(|v| self.scheduler.departure(v.schedule(), now).map(|d| (v.id, d)))
            .collect();
        let unplanned: Vec<RequestId> = self.registry.unplanned().collect();
        let mut report = CycleReport {
            eligible_vehicles: eligible.len(),
            unplanned_requests: unplanned.len(),
            ..CycleReport::default()
        };

        if !eligible.is_empty() && !unplanned.is_empty() {
            let outcome = if unplanned.len() > eligible.len() {
                report.mode = Some(CycleMode::VehicleInitiated);
                self.vehicle_initiated(eligible, unplanned, now, &mut report)
            } else {
                report.mode = Some(CycleMode::RequestInitiated);
                self.request_initiated(eligible, unplanned, now, &mut report)
            };
            if let Err(e) = outcome {
                self.enter(CyclePhase::Idle);
                return Err(e);
            }
        }

        self.enter(CyclePhase::Idle);
        debug!(
            mode = ?report.mode,
            eligible = report.eligible_vehicles,
            unplanned = report.unplanned_requests,
            assigned = report.assigned,
            failed = report.failed,
            rejected = report.rejected,
            "cycle done",
        );
        Ok(report)
    }

    fn request_initiated(
        &mut self,
        eligible: Vec<(VehicleId, Departure)>,
        unplanned: Vec<RequestId>,
        now: SimTime,
        report: &mut CycleReport,
    ) -> DispatchResult<()> {
        self.enter(CyclePhase::CandidateSelection);
        let limit = self.config.nearest_vehicles_limit;
        let filter = CandidateFilter::new(self.network(), eligible.iter().map(|&(v, d)| (v, d.node)));
        let mut free: BTreeMap<VehicleId, Departure> = eligible.into_iter().collect();

        // Route every first-choice pairing in one batch.
        let mut queries = Vec::new();
        for &id in &unplanned {
            let from = self.registry.get(id)?.from;
            for v in filter.nearest_vehicles(self.network(), from, limit) {
                if let Some(d) = free.get(&v) {
                    queries.push((d.node, from, d.time));
                }
            }
        }
        self.cache.prefetch(&self.oracle, &queries);

        for id in unplanned {
            if free.is_empty() {
                break;
            }
            let request = self.registry.get(id)?.clone();
            let taken = filter.len() - free.len();
            let pairs: Vec<(VehicleId, Departure)> = filter
                .nearest_vehicles(self.network(), request.from, limit + taken)
                .into_iter()
                .filter_map(|v| free.get(&v).map(|d| (v, *d)))
                .take(limit)
                .collect();

            self.enter(CyclePhase::Scoring);
            let mut scoring = Scoring::default();
            for (vehicle, departure) in pairs {
                self.score(&mut scoring, vehicle, departure, &request)?;
            }

            self.enter(CyclePhase::Assignment);
            match scoring.best.take() {
                Some((_, candidate)) => {
                    if self.commit(&candidate, &request, now)? {
                        free.remove(&candidate.vehicle);
                        report.assigned += 1;
                    }
                }
                None if scoring.all_unreachable() => self.fail_cycle(id, now, report)?,
                None => {}
            }
        }
        Ok(())
    }

    fn vehicle_initiated(
        &mut self,
        eligible: Vec<(VehicleId, Departure)>,
        unplanned: Vec<RequestId>,
        now: SimTime,
        report: &mut CycleReport,
    ) -> DispatchResult<()> {
        self.enter(CyclePhase::CandidateSelection);
        let limit = self.config.nearest_requests_limit;
        let mut origins = Vec::with_capacity(unplanned.len());
        for &id in &unplanned {
            origins.push((id, self.registry.get(id)?.from));
        }
        let filter = CandidateFilter::new(self.network(), origins);
        let mut open: BTreeSet<RequestId> = unplanned.iter().copied().collect();
        let mut tally: BTreeMap<RequestId, Scoring> = BTreeMap::new();

        for (vehicle, departure) in eligible {
            if open.is_empty() {
                break;
            }
            let taken = filter.len() - open.len();
            let ids: Vec<RequestId> = filter
                .nearest_requests(self.network(), departure.node, limit + taken)
                .into_iter()
                .filter(|r| open.contains(r))
                .take(limit)
                .collect();

            self.enter(CyclePhase::Scoring);
            let mut scoring = Scoring::default();
            for id in ids {
                let request = self.registry.get(id)?.clone();
                let per_request = tally.entry(id).or_default();
                per_request.scored += 1;
                let reachable_before = scoring.reachable;
                self.score(&mut scoring, vehicle, departure, &request)?;
                if scoring.reachable > reachable_before {
                    tally.entry(id).or_default().reachable += 1;
                }
            }

            self.enter(CyclePhase::Assignment);
            if let Some((_, candidate)) = scoring.best.take() {
                let request = self.registry.get(candidate.request)?.clone();
                if self.commit(&candidate, &request, now)? {
                    open.remove(&candidate.request);
                    report.assigned += 1;
                }
            }
        }

        for id in open {
            if tally.get(&id).is_some_and(Scoring::all_unreachable) {
                self.fail_cycle(id, now, report)?;
            }
        }
        Ok(())
    }

    /// Evaluate one pairing and offer it to `scoring`.  `NoPath` only counts
    /// as an unreachable candidate.
    fn score(
        &mut self,
        scoring: &mut Scoring,
        vehicle: VehicleId,
        departure: Departure,
        request: &Request,
    ) -> DispatchResult<()> {
        scoring.scored += 1;
        match self.scheduler.evaluate(&mut self.cache, &self.oracle, vehicle, departure, request) {
            Ok(candidate) => {
                let score = self.objective.score(&candidate);
                trace!(%vehicle, request = %request.id, score, "candidate scored");
                scoring.offer(score, candidate);
                Ok(())
            }
            Err(SpatialError::NoPath { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Assign `candidate`'s request and write the trip into its vehicle's
    /// schedule.  `Ok(false)` when the schedule refused it; the request is
    /// then requeued in its arrival position.
    pub(crate) fn commit(&mut self, candidate: &Candidate, request: &Request, now: SimTime) -> DispatchResult<bool> {
        self.enter(CyclePhase::Commit);
        let (vehicle, request_id) = (candidate.vehicle, candidate.request);
        let v = self.fleet.get_mut(vehicle)?;
        self.registry.assign(request_id, vehicle)?;
        let committed = self.scheduler.commit(&mut self.cache, &self.oracle, v.schedule_mut(), candidate, request, now);
        let outcome = match committed {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => return Err(self.escalate(vehicle, Some(request_id), e)),
            Err(e) => {
                self.registry.requeue(request_id)?;
                warn!(%vehicle, request = %request_id, error = %e, "assignment dropped, request requeued");
                return Ok(false);
            }
        };

        self.touched.insert(vehicle);
        if let Some(node) = outcome.diverted_at {
            self.events.push(DispatchEvent::VehicleDiverted { vehicle, node, at: now });
        }
        self.events.push(DispatchEvent::RequestPlanned {
            request: request_id,
            vehicle,
            pickup_at: outcome.pickup_at,
            at: now,
        });
        debug!(
            %vehicle,
            request = %request_id,
            pickup_at = %outcome.pickup_at,
            wait_secs = outcome.pickup_at.max(request.t0).since(request.t0),
            diverted = outcome.diverted_at.is_some(),
            "request assigned",
        );
        Ok(true)
    }

    fn fail_cycle(&mut self, request: RequestId, now: SimTime, report: &mut CycleReport) -> DispatchResult<()> {
        let failed_cycles = self.registry.record_failed_cycle(request)?;
        report.failed += 1;
        if failed_cycles < self.config.retry_budget {
            debug!(%request, failed_cycles, "no reachable vehicle this cycle");
            return Ok(());
        }
        self.registry.transition(request, RequestStatus::Rejected)?;
        self.events.push(DispatchEvent::RequestRejected { request, failed_cycles, at: now });
        report.rejected += 1;
        warn!(%request, failed_cycles, "request rejected: no reachable vehicle");
        Ok(())
    }

    fn plan_dropoff(&mut self, vehicle: VehicleId, request: RequestId) -> DispatchResult<()> {
        let request = self.registry.get(request)?.clone();
        let v = self.fleet.get_mut(vehicle)?;
        let planned = self.scheduler.append_dropoff_leg(&mut self.cache, &self.oracle, v.schedule_mut(), &request);
        planned.map_err(|e| self.escalate(vehicle, Some(request.id), e))?;
        self.touched.insert(vehicle);
        Ok(())
    }

    fn enter(&mut self, phase: CyclePhase) {
        if self.phase != phase {
            trace!(from = ?self.phase, to = ?phase, "cycle phase");
            self.phase = phase;
        }
    }

    /// Attach a schedule dump to invariant violations.
    fn escalate(&self, vehicle: VehicleId, request: Option<RequestId>, err: DispatchError) -> DispatchError {
        match err {
            DispatchError::Schedule(source) if is_fatal_schedule_error(&source) => {
                let Ok(v) = self.fleet.get(vehicle) else {
                    return DispatchError::Schedule(source);
                };
                error!(%vehicle, ?request, error = %source, "schedule invariant violated");
                DispatchError::Fatal { request, source, dump: Box::new(v.schedule().dump()) }
            }
            other => other,
        }
    }
}
