use thiserror::Error;

use dvrp_core::{RequestId, VehicleId};
use dvrp_fleet::{FleetError, RequestStatus};
use dvrp_schedule::{ScheduleDump, ScheduleError};
use dvrp_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch config error: {0}")]
    Config(String),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Fleet(#[from] FleetError),

    /// A schedule invariant broke while committing.  The run cannot go on.
    #[error("fatal schedule error (request {request:?}): {source}\n{dump}")]
    Fatal {
        request: Option<RequestId>,
        #[source]
        source:  ScheduleError,
        dump:    Box<ScheduleDump>,
    },

    #[error("{vehicle} cannot take new work: {reason}")]
    NotEligible { vehicle: VehicleId, reason: &'static str },

    #[error("{request} cannot be withdrawn in status {status:?}")]
    NotWithdrawable { request: RequestId, status: RequestStatus },
}

impl DispatchError {
    /// Continuity and consistency violations abort the run; everything else
    /// is handled per request.
    pub fn is_fatal(&self) -> bool {
        match self {
            DispatchError::Fatal { .. } => true,
            DispatchError::Schedule(e) => is_fatal_schedule_error(e),
            _ => false,
        }
    }
}

pub(crate) fn is_fatal_schedule_error(e: &ScheduleError) -> bool {
    matches!(
        e,
        ScheduleError::Continuity { .. } | ScheduleError::Inconsistency { .. } | ScheduleError::NotPlanned { .. }
    )
}

pub type DispatchResult<T> = Result<T, DispatchError>;
