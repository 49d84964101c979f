use thiserror::Error;

use dvrp_core::{NodeId, RequestId, SimTime, VehicleId};

use crate::request::RequestStatus;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    #[error("{request}: illegal status transition {from:?} → {to:?}")]
    IllegalTransition { request: RequestId, from: RequestStatus, to: RequestStatus },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("vehicle {name:?}: shift ends at {t1} before it starts at {t0}")]
    InvalidShift { name: String, t0: SimTime, t1: SimTime },

    #[error("fleet parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FleetResult<T> = Result<T, FleetError>;
