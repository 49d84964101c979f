//! Task types: the building blocks of a vehicle schedule.
//!
//! A task is a half-open interval `[begin, end)` bound to a start and an end
//! node.  Drives move the vehicle along a path; stays keep it at one node.
//! Both kinds carry a purpose, and the purposes that serve a request carry
//! its `RequestId` (the registry owns the request itself).

use std::fmt;
use std::sync::Arc;

use dvrp_core::{NodeId, RequestId, SimTime};
use dvrp_spatial::Route;

// ── Purposes ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DrivePurpose {
    /// Empty drive towards a request's origin.
    ToPickup(RequestId),
    /// Occupied drive towards a request's destination.
    ToDropoff(RequestId),
    /// Empty drive with no request attached (repositioning, resume).
    Cruise,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StayPurpose {
    Pickup(RequestId),
    Dropoff(RequestId),
    /// Idle at a node.
    Wait,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TaskKind {
    Drive { purpose: DrivePurpose, path: Arc<Route> },
    Stay { purpose: StayPurpose, node: NodeId },
}

/// Lifecycle of a single task.  Only `Planned` tasks may be removed or
/// replaced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskStatus {
    Planned,
    Started,
    Performed,
}

// ── Task ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub begin: SimTime,
    pub end:   SimTime,
    pub kind:  TaskKind,
    status:    TaskStatus,
}

impl Task {
    /// A drive along `path` departing at `begin`; it ends when the path's
    /// travel time has elapsed.
    pub fn drive(purpose: DrivePurpose, path: Arc<Route>, begin: SimTime) -> Self {
        let end = begin + path.travel_time_secs;
        Self { begin, end, kind: TaskKind::Drive { purpose, path }, status: TaskStatus::Planned }
    }

    /// A stay at `node` over `[begin, end)`.  `end` earlier than `begin` is
    /// raised to `begin`.
    pub fn stay(purpose: StayPurpose, node: NodeId, begin: SimTime, end: SimTime) -> Self {
        debug_assert!(end >= begin, "stay ends before it begins");
        Self {
            begin,
            end: end.max(begin),
            kind: TaskKind::Stay { purpose, node },
            status: TaskStatus::Planned,
        }
    }

    pub fn wait(node: NodeId, begin: SimTime, end: SimTime) -> Self {
        Self::stay(StayPurpose::Wait, node, begin, end)
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    pub fn begin_node(&self) -> NodeId {
        match &self.kind {
            TaskKind::Drive { path, .. } => path.from(),
            TaskKind::Stay { node, .. } => *node,
        }
    }

    pub fn end_node(&self) -> NodeId {
        match &self.kind {
            TaskKind::Drive { path, .. } => path.to(),
            TaskKind::Stay { node, .. } => *node,
        }
    }

    /// The request this task serves, if any.
    pub fn request(&self) -> Option<RequestId> {
        match self.kind {
            TaskKind::Drive { purpose: DrivePurpose::ToPickup(r) | DrivePurpose::ToDropoff(r), .. }
            | TaskKind::Stay { purpose: StayPurpose::Pickup(r) | StayPurpose::Dropoff(r), .. } => {
                Some(r)
            }
            _ => None,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        self.end.saturating_since(self.begin)
    }

    /// `true` if `time` lies in `[begin, end)`.  Zero-length tasks contain no
    /// time at all.
    #[inline]
    pub fn contains(&self, time: SimTime) -> bool {
        self.begin <= time && time < self.end
    }

    pub fn path(&self) -> Option<&Arc<Route>> {
        match &self.kind {
            TaskKind::Drive { path, .. } => Some(path),
            TaskKind::Stay { .. } => None,
        }
    }

    pub fn is_drive(&self) -> bool {
        matches!(self.kind, TaskKind::Drive { .. })
    }

    pub fn is_wait(&self) -> bool {
        matches!(self.kind, TaskKind::Stay { purpose: StayPurpose::Wait, .. })
    }

    pub fn is_cruise(&self) -> bool {
        matches!(self.kind, TaskKind::Drive { purpose: DrivePurpose::Cruise, .. })
    }

    pub fn is_pickup_stay(&self) -> bool {
        matches!(self.kind, TaskKind::Stay { purpose: StayPurpose::Pickup(_), .. })
    }

    pub fn is_dropoff_stay(&self) -> bool {
        matches!(self.kind, TaskKind::Stay { purpose: StayPurpose::Dropoff(_), .. })
    }

    /// The same task moved `secs` later.  Drive paths carry relative
    /// offsets, so only the interval moves.
    pub fn shifted(&self, secs: u64) -> Task {
        let mut t = self.clone();
        t.begin = t.begin + secs;
        t.end = t.end + secs;
        t
    }

    /// Short kebab-case label, stable across releases; used in dumps and logs.
    pub fn label(&self) -> &'static str {
        match &self.kind {
            TaskKind::Drive { purpose: DrivePurpose::ToPickup(_), .. } => "drive-to-pickup",
            TaskKind::Drive { purpose: DrivePurpose::ToDropoff(_), .. } => "drive-to-dropoff",
            TaskKind::Drive { purpose: DrivePurpose::Cruise, .. } => "cruise",
            TaskKind::Stay { purpose: StayPurpose::Pickup(_), .. } => "pickup-stay",
            TaskKind::Stay { purpose: StayPurpose::Dropoff(_), .. } => "dropoff-stay",
            TaskKind::Stay { purpose: StayPurpose::Wait, .. } => "wait-stay",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {}) {}→{}",
            self.label(),
            self.begin,
            self.end,
            self.begin_node(),
            self.end_node(),
        )?;
        if let Some(r) = self.request() {
            write!(f, " {r}")?;
        }
        Ok(())
    }
}
