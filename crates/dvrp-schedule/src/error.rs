use thiserror::Error;

use dvrp_core::{NodeId, SimTime, VehicleId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A task would not start where and when its predecessor ends.
    #[error(
        "{vehicle}: task {index} breaks continuity: expected begin {expected_time} at {expected_node}, \
         got {found_time} at {found_node}"
    )]
    Continuity {
        vehicle:       VehicleId,
        index:         usize,
        expected_time: SimTime,
        expected_node: NodeId,
        found_time:    SimTime,
        found_node:    NodeId,
    },

    /// The schedule's state disagrees with the requested operation or time.
    #[error("{vehicle}: schedule inconsistency: {reason}")]
    Inconsistency { vehicle: VehicleId, reason: String },

    #[error("{vehicle}: diversion not allowed: {reason}")]
    DiversionNotAllowed { vehicle: VehicleId, reason: &'static str },

    /// Only planned tasks may be replaced or removed.
    #[error("{vehicle}: task {index} is not planned and cannot be replaced")]
    NotPlanned { vehicle: VehicleId, index: usize },

    #[error("{0}: schedule is completed")]
    Completed(VehicleId),
}

impl ScheduleError {
    pub(crate) fn inconsistency(vehicle: VehicleId, reason: impl Into<String>) -> Self {
        Self::Inconsistency { vehicle, reason: reason.into() }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
