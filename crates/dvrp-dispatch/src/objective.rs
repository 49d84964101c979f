//! Assignment objectives.  Lower scores win; ties keep the candidate that
//! was scored first (nearest, then lowest id).

use crate::config::ObjectiveKind;
use crate::scheduler::Candidate;

pub trait Objective: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, candidate: &Candidate) -> f64;
}

/// Earliest arrival at the pickup, measured from the request's `t0`.
///
/// Vehicles that would arrive before `t0` still compete on how early they
/// get there, which keeps the score strictly ordered among them.
#[derive(Copy, Clone, Debug, Default)]
pub struct MinWaitTime;

impl Objective for MinWaitTime {
    fn name(&self) -> &'static str {
        "min_wait_time"
    }

    fn score(&self, c: &Candidate) -> f64 {
        c.pickup_arrival.0 as f64 - c.t0.0 as f64
    }
}

/// Least empty distance added to the fleet.  The occupied leg is the same
/// for every vehicle, so only the drive to the pickup counts.
#[derive(Copy, Clone, Debug, Default)]
pub struct MinTotalDistance;

impl Objective for MinTotalDistance {
    fn name(&self) -> &'static str {
        "min_total_distance"
    }

    fn score(&self, c: &Candidate) -> f64 {
        c.to_pickup.travel_cost
    }
}

pub fn objective_for(kind: ObjectiveKind) -> Box<dyn Objective> {
    match kind {
        ObjectiveKind::MinWaitTime => Box::new(MinWaitTime),
        ObjectiveKind::MinTotalDistance => Box::new(MinTotalDistance),
    }
}
