use thiserror::Error;

use dvrp_core::{DvrpError, RequestId};
use dvrp_dispatch::DispatchError;
use dvrp_fleet::FleetError;
use dvrp_schedule::{ScheduleDump, ScheduleError};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] DvrpError),

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error(transparent)]
    Dispatch(DispatchError),

    /// A schedule invariant broke.  Carries the offending schedule.
    #[error("run aborted (request {request:?}): {source}\n{dump}")]
    Fatal {
        request: Option<RequestId>,
        #[source]
        source:  ScheduleError,
        dump:    Box<ScheduleDump>,
    },
}

impl From<DispatchError> for SimError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Fatal { request, source, dump } => SimError::Fatal { request, source, dump },
            other => SimError::Dispatch(other),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
