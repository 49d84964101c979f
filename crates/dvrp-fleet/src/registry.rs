//! `RequestRegistry`: owner of every request of a run.
//!
//! Ids are assigned densely in submission order, so `RequestId` order is
//! arrival order.  The unplanned queue is a `BTreeSet<RequestId>`: a request
//! that is re-queued after losing its vehicle goes back to its original place
//! rather than to the end of the line.
//!
//! All status changes go through [`RequestRegistry::transition`] (or the
//! helpers built on it), which validates them and keeps the queue in sync.

use std::collections::BTreeSet;

use tracing::trace;

use dvrp_core::{RequestId, SimTime, VehicleId};

use crate::error::{FleetError, FleetResult};
use crate::request::{NewRequest, Request, RequestStatus};

#[derive(Default)]
pub struct RequestRegistry {
    requests:  Vec<Request>,
    unplanned: BTreeSet<RequestId>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request as `Unplanned` and return its id.
    pub fn submit(&mut self, spec: NewRequest) -> RequestId {
        let id = RequestId(self.requests.len() as u32);
        self.requests.push(Request::new(id, spec));
        self.unplanned.insert(id);
        trace!(request = %id, from = %spec.from, to = %spec.to, "request submitted");
        id
    }

    pub fn get(&self, id: RequestId) -> FleetResult<&Request> {
        self.requests.get(id.index()).ok_or(FleetError::RequestNotFound(id))
    }

    fn get_mut(&mut self, id: RequestId) -> FleetResult<&mut Request> {
        self.requests.get_mut(id.index()).ok_or(FleetError::RequestNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.requests.iter()
    }

    /// Unplanned requests in arrival order.
    pub fn unplanned(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.unplanned.iter().copied()
    }

    pub fn unplanned_count(&self) -> usize {
        self.unplanned.len()
    }

    /// Number of requests currently in `status`.
    pub fn count(&self, status: RequestStatus) -> usize {
        self.requests.iter().filter(|r| r.status() == status).count()
    }

    /// Move `id` to `next`, returning the previous status.
    pub fn transition(&mut self, id: RequestId, next: RequestStatus) -> FleetResult<RequestStatus> {
        let req = self.get_mut(id)?;
        let prev = req.status();
        if !prev.can_transition_to(next) {
            return Err(FleetError::IllegalTransition { request: id, from: prev, to: next });
        }
        req.set_status(next);
        if prev == RequestStatus::Unplanned {
            self.unplanned.remove(&id);
        }
        if next == RequestStatus::Unplanned {
            self.unplanned.insert(id);
        }
        Ok(prev)
    }

    /// `Unplanned → Planned` on `vehicle`.
    pub fn assign(&mut self, id: RequestId, vehicle: VehicleId) -> FleetResult<()> {
        self.transition(id, RequestStatus::Planned)?;
        self.get_mut(id)?.set_vehicle(Some(vehicle));
        Ok(())
    }

    /// `Planned → Unplanned`, dropping the vehicle.
    pub fn requeue(&mut self, id: RequestId) -> FleetResult<()> {
        self.transition(id, RequestStatus::Unplanned)?;
        self.get_mut(id)?.set_vehicle(None);
        Ok(())
    }

    /// `Planned → Pickup` at `now`.
    pub fn begin_pickup(&mut self, id: RequestId, now: SimTime) -> FleetResult<()> {
        self.transition(id, RequestStatus::Pickup)?;
        self.get_mut(id)?.set_pickup_time(now);
        Ok(())
    }

    /// `Dropoff → Completed` at `now`.
    pub fn complete(&mut self, id: RequestId, now: SimTime) -> FleetResult<()> {
        self.transition(id, RequestStatus::Completed)?;
        self.get_mut(id)?.set_dropoff_time(now);
        Ok(())
    }

    /// Count one failed dispatch cycle and return the new total.
    pub fn record_failed_cycle(&mut self, id: RequestId) -> FleetResult<u32> {
        Ok(self.get_mut(id)?.bump_failed_cycles())
    }
}
