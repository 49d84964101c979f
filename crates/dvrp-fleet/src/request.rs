//! Transport requests and their status machine.
//!
//! ```text
//! UNPLANNED → PLANNED | REJECTED | WITHDRAWN
//! PLANNED   → PICKUP  | UNPLANNED (re-queued) | WITHDRAWN
//! PICKUP    → ON_BOARD
//! ON_BOARD  → DROPOFF
//! DROPOFF   → COMPLETED
//! ```

use dvrp_core::{NodeId, RequestId, SimTime, VehicleId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestStatus {
    Unplanned,
    Planned,
    /// Pickup stay in progress.
    Pickup,
    OnBoard,
    /// Dropoff stay in progress.
    Dropoff,
    Completed,
    Rejected,
    Withdrawn,
}

impl RequestStatus {
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Unplanned, Planned | Rejected | Withdrawn)
                | (Planned, Pickup | Unplanned | Withdrawn)
                | (Pickup, OnBoard)
                | (OnBoard, Dropoff)
                | (Dropoff, Completed)
        )
    }

    /// Archived states: no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected | RequestStatus::Withdrawn)
    }
}

/// What a submitter provides; the registry assigns the id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NewRequest {
    pub from:      NodeId,
    pub to:        NodeId,
    /// Earliest pickup time.
    pub t0:        SimTime,
    pub submitted: SimTime,
}

#[derive(Clone, Debug)]
pub struct Request {
    pub id:        RequestId,
    pub from:      NodeId,
    pub to:        NodeId,
    pub t0:        SimTime,
    pub submitted: SimTime,
    status:        RequestStatus,
    vehicle:       Option<VehicleId>,
    failed_cycles: u32,
    pickup_time:   Option<SimTime>,
    dropoff_time:  Option<SimTime>,
}

impl Request {
    pub(crate) fn new(id: RequestId, spec: NewRequest) -> Self {
        Self {
            id,
            from: spec.from,
            to: spec.to,
            t0: spec.t0,
            submitted: spec.submitted,
            status: RequestStatus::Unplanned,
            vehicle: None,
            failed_cycles: 0,
            pickup_time: None,
            dropoff_time: None,
        }
    }

    pub fn status(&self) -> RequestStatus { self.status }

    /// The vehicle the request is assigned to, if any.
    pub fn vehicle(&self) -> Option<VehicleId> { self.vehicle }

    /// Dispatch cycles in which every candidate vehicle was unreachable.
    pub fn failed_cycles(&self) -> u32 { self.failed_cycles }

    /// When the pickup stay began.
    pub fn pickup_time(&self) -> Option<SimTime> { self.pickup_time }

    pub fn dropoff_time(&self) -> Option<SimTime> { self.dropoff_time }

    /// Wait time once picked up: pickup start minus earliest pickup time.
    pub fn wait_secs(&self) -> Option<u64> {
        self.pickup_time.map(|p| p.saturating_since(self.t0))
    }

    pub(crate) fn set_status(&mut self, status: RequestStatus) {
        self.status = status;
    }

    pub(crate) fn set_vehicle(&mut self, vehicle: Option<VehicleId>) {
        self.vehicle = vehicle;
    }

    pub(crate) fn bump_failed_cycles(&mut self) -> u32 {
        self.failed_cycles += 1;
        self.failed_cycles
    }

    pub(crate) fn set_pickup_time(&mut self, at: SimTime) {
        self.pickup_time = Some(at);
    }

    pub(crate) fn set_dropoff_time(&mut self, at: SimTime) {
        self.dropoff_time = Some(at);
    }
}
