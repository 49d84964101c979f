//! `Schedule`: one vehicle's time-ordered task list.
//!
//! # Invariants
//!
//! - Adjacent tasks touch: `tasks[i].end == tasks[i+1].begin` and
//!   `tasks[i].end_node() == tasks[i+1].begin_node()`.  The first task begins
//!   at the vehicle's `t0` at its start node.
//! - Task statuses form a prefix of `Performed`, then at most one `Started`
//!   task (the current task), then only `Planned` tasks.
//! - Only `Planned` tasks are ever removed or replaced.
//!
//! Every mutating operation validates its input before touching the task
//! list, so a failed call leaves the schedule unchanged.
//!
//! # Execution pointer
//!
//! The tick adapter drives execution with [`Schedule::start_next_task`] and
//! [`Schedule::end_current_task`].  When the last task ends before the
//! vehicle's `t1`, a wait-stay until `t1` is appended so the vehicle always
//! has something to do until its shift ends.

use std::sync::Arc;

use tracing::debug;

use dvrp_core::{NodeId, RequestId, SimTime, VehicleId};
use dvrp_spatial::Route;

use crate::dump::{ScheduleDump, TaskDump};
use crate::error::{ScheduleError, ScheduleResult};
use crate::policy::DiversionPolicy;
use crate::task::{DrivePurpose, Task, TaskKind, TaskStatus};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScheduleStatus {
    /// No tasks.
    Unplanned,
    /// Tasks exist, none started yet.
    Planned,
    Started,
    /// The last task was performed at or after `t1`.  Terminal.
    Completed,
}

/// Where and when a drive in progress can next change course.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiversionPoint {
    pub node: NodeId,
    pub time: SimTime,
    /// Position of `node` in the current drive's path.
    pub path_index: usize,
}

#[derive(Clone, Debug)]
pub struct Schedule {
    vehicle:    VehicleId,
    start_node: NodeId,
    t0:         SimTime,
    t1:         SimTime,
    tasks:      Vec<Task>,
    /// Number of leading `Performed` tasks.
    performed:  usize,
    /// Index of the `Started` task; always equals `performed` when set.
    current:    Option<usize>,
    status:     ScheduleStatus,
}

impl Schedule {
    pub fn new(vehicle: VehicleId, start_node: NodeId, t0: SimTime, t1: SimTime) -> Self {
        Self {
            vehicle,
            start_node,
            t0,
            t1,
            tasks: Vec::new(),
            performed: 0,
            current: None,
            status: ScheduleStatus::Unplanned,
        }
    }

    /// Drop all tasks and return to `Unplanned`.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.performed = 0;
        self.current = None;
        self.status = ScheduleStatus::Unplanned;
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn vehicle(&self) -> VehicleId { self.vehicle }
    pub fn start_node(&self) -> NodeId { self.start_node }
    pub fn t0(&self) -> SimTime { self.t0 }
    pub fn t1(&self) -> SimTime { self.t1 }
    pub fn status(&self) -> ScheduleStatus { self.status }
    pub fn tasks(&self) -> &[Task] { &self.tasks }
    pub fn task_count(&self) -> usize { self.tasks.len() }

    /// End of the last task, or `t0` for an empty schedule.
    pub fn end_time(&self) -> SimTime {
        self.tasks.last().map_or(self.t0, |t| t.end)
    }

    /// End node of the last task, or the start node for an empty schedule.
    pub fn end_node(&self) -> NodeId {
        self.tasks.last().map_or(self.start_node, Task::end_node)
    }

    pub fn last_task(&self) -> Option<&Task> {
        self.tasks.last()
    }

    /// The task the execution pointer is on.
    pub fn current(&self) -> Option<&Task> {
        self.current.map(|i| &self.tasks[i])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The task `start_next_task` would start, if no task is current.
    pub fn next_task(&self) -> Option<&Task> {
        match self.current {
            Some(_) => None,
            None => self.tasks.get(self.performed),
        }
    }

    /// Index of the first `Planned` task (or `task_count()` if none).
    pub fn first_planned_index(&self) -> usize {
        self.performed + usize::from(self.current.is_some())
    }

    /// Index of the first task serving `request`.
    pub fn task_index_of(&self, request: RequestId) -> Option<usize> {
        self.tasks.iter().position(|t| t.request() == Some(request))
    }

    /// The task whose interval contains `time`.
    ///
    /// `Ok(None)` for an unplanned schedule.  Any other schedule must cover
    /// `time`, otherwise the vehicle's whereabouts are undefined and this is
    /// an inconsistency.
    pub fn current_task(&self, time: SimTime) -> ScheduleResult<Option<&Task>> {
        if self.status == ScheduleStatus::Unplanned {
            return Ok(None);
        }
        match self.tasks.iter().find(|t| t.contains(time)) {
            Some(task) => Ok(Some(task)),
            None => Err(ScheduleError::inconsistency(
                self.vehicle,
                format!(
                    "no task at {time}, schedule covers [{}, {})",
                    self.tasks.first().map_or(self.t0, |t| t.begin),
                    self.end_time(),
                ),
            )),
        }
    }

    // ── Planning ──────────────────────────────────────────────────────────────

    /// Append `task` at the end of the schedule.
    pub fn append_task(&mut self, task: Task) -> ScheduleResult<()> {
        self.ensure_open()?;
        if task.status() != TaskStatus::Planned {
            return Err(ScheduleError::inconsistency(self.vehicle, "appended task is not planned"));
        }
        let index = self.tasks.len();
        self.check_link(index, self.link_before(index), &task)?;
        self.tasks.push(task);
        if self.status == ScheduleStatus::Unplanned {
            self.status = ScheduleStatus::Planned;
        }
        Ok(())
    }

    /// Replace every task from index `from` onwards with `tasks`.
    ///
    /// All replaced tasks must be `Planned` and `tasks` must chain onto the
    /// task before `from`.  Returns the removed tasks.
    pub fn replace_tail(&mut self, from: usize, tasks: Vec<Task>) -> ScheduleResult<Vec<Task>> {
        self.ensure_open()?;
        if from > self.tasks.len() {
            return Err(ScheduleError::inconsistency(
                self.vehicle,
                format!("replace from {from} past end ({})", self.tasks.len()),
            ));
        }
        if from < self.first_planned_index() {
            return Err(ScheduleError::NotPlanned { vehicle: self.vehicle, index: from });
        }

        let mut link = self.link_before(from);
        for (k, task) in tasks.iter().enumerate() {
            if task.status() != TaskStatus::Planned {
                return Err(ScheduleError::NotPlanned { vehicle: self.vehicle, index: from + k });
            }
            self.check_link(from + k, link, task)?;
            link = (task.end, task.end_node());
        }

        let removed = self.tasks.split_off(from);
        self.tasks.extend(tasks);
        self.status = match (self.status, self.tasks.is_empty()) {
            (_, true) => ScheduleStatus::Unplanned,
            (ScheduleStatus::Unplanned, false) => ScheduleStatus::Planned,
            (s, false) => s,
        };
        Ok(removed)
    }

    /// Cut a current wait-stay short at `now` so new work can follow it.
    ///
    /// The wait must be the last task.  `now` is clamped into the wait's
    /// interval.
    pub fn truncate_current_wait(&mut self, now: SimTime) -> ScheduleResult<()> {
        let idx = match self.current {
            Some(i) if self.tasks[i].is_wait() => i,
            _ => return Err(ScheduleError::inconsistency(self.vehicle, "current task is not a wait")),
        };
        if idx + 1 != self.tasks.len() {
            return Err(ScheduleError::inconsistency(self.vehicle, "current wait is not the last task"));
        }
        let task = &mut self.tasks[idx];
        if now < task.begin {
            return Err(ScheduleError::inconsistency(self.vehicle, format!("{now} is before the wait")));
        }
        task.end = now.min(task.end);
        Ok(())
    }

    // ── Diversion ─────────────────────────────────────────────────────────────

    /// The first node on the current drive's path reached at or after `now`.
    pub fn diversion_point(&self, now: SimTime, policy: DiversionPolicy) -> ScheduleResult<DiversionPoint> {
        if !policy.allows_diversion() {
            return Err(ScheduleError::DiversionNotAllowed {
                vehicle: self.vehicle,
                reason: "diversion disabled by policy",
            });
        }
        let task = match self.current() {
            Some(t) if t.is_drive() => t,
            _ => {
                return Err(ScheduleError::DiversionNotAllowed {
                    vehicle: self.vehicle,
                    reason: "current task is not a drive",
                });
            }
        };
        if now < task.begin {
            return Err(ScheduleError::inconsistency(self.vehicle, format!("{now} is before the drive")));
        }
        let path = task.path().map(|p| &**p).ok_or_else(|| {
            ScheduleError::inconsistency(self.vehicle, "drive without a path")
        })?;
        let (path_index, node, offset) = path.first_node_at_or_after(now.since(task.begin));
        Ok(DiversionPoint { node, time: task.begin + offset, path_index })
    }

    /// Split the drive in progress at its diversion point and continue along
    /// `path` with `purpose`.
    ///
    /// The current task keeps the prefix up to the diversion point; a new
    /// drive along `path` follows (omitted when `path` is trivial).  Every
    /// planned task after the current one is removed and returned.
    pub fn divert_current_task(
        &mut self,
        path: Arc<Route>,
        purpose: DrivePurpose,
        now: SimTime,
        policy: DiversionPolicy,
    ) -> ScheduleResult<Vec<Task>> {
        let point = self.diversion_point(now, policy)?;
        let idx = self.current.ok_or_else(|| {
            ScheduleError::inconsistency(self.vehicle, "no current task")
        })?;
        if path.from() != point.node {
            return Err(ScheduleError::Continuity {
                vehicle:       self.vehicle,
                index:         idx + 1,
                expected_time: point.time,
                expected_node: point.node,
                found_time:    point.time,
                found_node:    path.from(),
            });
        }

        let removed = self.tasks.split_off(idx + 1);
        let current = &mut self.tasks[idx];
        if let TaskKind::Drive { path: old, .. } = &mut current.kind {
            *old = Arc::new(old.prefix(point.path_index));
        }
        current.end = point.time;
        if !path.is_trivial() {
            self.tasks.push(Task::drive(purpose, path, point.time));
        }
        debug!(
            vehicle = %self.vehicle,
            node = %point.node,
            at = %point.time,
            removed = removed.len(),
            "diverted current drive",
        );
        Ok(removed)
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Start the next task.  Fails if a task is already current, nothing is
    /// left to start, or the next task begins after `now`.
    pub fn start_next_task(&mut self, now: SimTime) -> ScheduleResult<&Task> {
        if self.current.is_some() {
            return Err(ScheduleError::inconsistency(self.vehicle, "a task is already started"));
        }
        self.ensure_open()?;
        let idx = self.performed;
        let Some(task) = self.tasks.get_mut(idx) else {
            return Err(ScheduleError::inconsistency(self.vehicle, "no task left to start"));
        };
        if task.begin > now {
            return Err(ScheduleError::inconsistency(
                self.vehicle,
                format!("task {idx} begins at {} after {now}", task.begin),
            ));
        }
        task.set_status(TaskStatus::Started);
        self.current = Some(idx);
        self.status = ScheduleStatus::Started;
        Ok(&self.tasks[idx])
    }

    /// Mark the current task performed and return a copy of it.
    ///
    /// Ending the last task either completes the schedule (at or after `t1`)
    /// or appends a wait-stay until `t1`.  A pickup-stay past `t1` leaves the
    /// schedule open with nothing planned, since the passenger still has to
    /// be dropped off.
    pub fn end_current_task(&mut self, now: SimTime) -> ScheduleResult<Task> {
        let idx = self.current.ok_or_else(|| {
            ScheduleError::inconsistency(self.vehicle, "no current task")
        })?;
        let task = &mut self.tasks[idx];
        if now < task.end {
            return Err(ScheduleError::inconsistency(
                self.vehicle,
                format!("task {idx} ends at {} after {now}", task.end),
            ));
        }
        task.set_status(TaskStatus::Performed);
        let finished = task.clone();
        self.performed += 1;
        self.current = None;

        if idx + 1 == self.tasks.len() {
            if finished.end < self.t1 {
                self.tasks.push(Task::wait(finished.end_node(), finished.end, self.t1));
            } else if !finished.is_pickup_stay() {
                self.status = ScheduleStatus::Completed;
            }
        }
        Ok(finished)
    }

    // ── Validation ────────────────────────────────────────────────────────────

    /// Verify the continuity invariant over the whole task list.
    pub fn check_continuity(&self) -> ScheduleResult<()> {
        for (i, task) in self.tasks.iter().enumerate() {
            self.check_link(i, self.link_before(i), task)?;
        }
        Ok(())
    }

    pub fn dump(&self) -> ScheduleDump {
        ScheduleDump {
            vehicle: self.vehicle,
            status:  self.status,
            current: self.current,
            t0:      self.t0,
            t1:      self.t1,
            tasks:   self.tasks.iter().enumerate().map(|(i, t)| TaskDump::new(i, t)).collect(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn ensure_open(&self) -> ScheduleResult<()> {
        match self.status {
            ScheduleStatus::Completed => Err(ScheduleError::Completed(self.vehicle)),
            _ => Ok(()),
        }
    }

    /// Where and when a task at `index` must begin.
    fn link_before(&self, index: usize) -> (SimTime, NodeId) {
        match index {
            0 => (self.t0, self.start_node),
            i => (self.tasks[i - 1].end, self.tasks[i - 1].end_node()),
        }
    }

    fn check_link(&self, index: usize, (time, node): (SimTime, NodeId), task: &Task) -> ScheduleResult<()> {
        if task.begin == time && task.begin_node() == node {
            return Ok(());
        }
        Err(ScheduleError::Continuity {
            vehicle:       self.vehicle,
            index,
            expected_time: time,
            expected_node: node,
            found_time:    task.begin,
            found_node:    task.begin_node(),
        })
    }
}
