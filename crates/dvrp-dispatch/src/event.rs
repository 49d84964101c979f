//! Status changes published by the dispatcher.

use dvrp_core::{NodeId, RequestId, SimTime, VehicleId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DispatchEvent {
    RequestPlanned { request: RequestId, vehicle: VehicleId, pickup_at: SimTime, at: SimTime },
    PickupStarted { request: RequestId, vehicle: VehicleId, at: SimTime },
    PassengerOnBoard { request: RequestId, vehicle: VehicleId, at: SimTime },
    DropoffStarted { request: RequestId, vehicle: VehicleId, at: SimTime },
    RequestCompleted { request: RequestId, vehicle: VehicleId, at: SimTime },
    /// Retry budget exhausted.
    RequestRejected { request: RequestId, failed_cycles: u32, at: SimTime },
    RequestWithdrawn { request: RequestId, at: SimTime },
    VehicleIdle { vehicle: VehicleId, at: SimTime },
    VehicleDiverted { vehicle: VehicleId, node: NodeId, at: SimTime },
    VehicleRepositioned { vehicle: VehicleId, to: NodeId, at: SimTime },
}

impl DispatchEvent {
    pub fn time(&self) -> SimTime {
        match *self {
            DispatchEvent::RequestPlanned { at, .. }
            | DispatchEvent::PickupStarted { at, .. }
            | DispatchEvent::PassengerOnBoard { at, .. }
            | DispatchEvent::DropoffStarted { at, .. }
            | DispatchEvent::RequestCompleted { at, .. }
            | DispatchEvent::RequestRejected { at, .. }
            | DispatchEvent::RequestWithdrawn { at, .. }
            | DispatchEvent::VehicleIdle { at, .. }
            | DispatchEvent::VehicleDiverted { at, .. }
            | DispatchEvent::VehicleRepositioned { at, .. } => at,
        }
    }

    pub fn request(&self) -> Option<RequestId> {
        match *self {
            DispatchEvent::RequestPlanned { request, .. }
            | DispatchEvent::PickupStarted { request, .. }
            | DispatchEvent::PassengerOnBoard { request, .. }
            | DispatchEvent::DropoffStarted { request, .. }
            | DispatchEvent::RequestCompleted { request, .. }
            | DispatchEvent::RequestRejected { request, .. }
            | DispatchEvent::RequestWithdrawn { request, .. } => Some(request),
            _ => None,
        }
    }
}
