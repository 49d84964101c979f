//! Dispatch configuration surface.
//!
//! Every field has a default, so a host config only needs to name what it
//! changes:
//!
//! ```json
//! { "nearest_vehicles_limit": 20, "diversion_allowed": true, "trigger": { "every_n_ticks": 10 } }
//! ```

use serde::{Deserialize, Serialize};

use dvrp_schedule::DiversionPolicy;
use dvrp_spatial::TimeDiscretizer;

use crate::error::{DispatchError, DispatchResult};

/// Which assignment goal the optimizer pursues.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Earliest arrival at the pickup relative to the request's `t0`.
    #[default]
    MinWaitTime,
    /// Least empty distance driven to reach the pickup.
    MinTotalDistance,
}

/// When `on_tick` actually runs a cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationTrigger {
    #[default]
    EveryTick,
    /// On the first tick and every `n`-th tick after it.
    EveryNTicks(u32),
    /// Only on ticks after a request was submitted or withdrawn, or a vehicle
    /// went idle.
    OnEvents,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Candidate vehicles scored per request.
    pub nearest_vehicles_limit: usize,
    /// Candidate requests scored per vehicle (vehicle-initiated cycles).
    pub nearest_requests_limit: usize,
    pub bucket_width_secs: u64,
    pub bucket_count: u32,
    /// Wrap cache buckets modulo `bucket_count` instead of clamping.
    pub cyclic_buckets: bool,
    pub diversion_allowed: bool,
    pub destination_known: bool,
    pub objective: ObjectiveKind,
    pub pickup_duration_secs: u64,
    pub dropoff_duration_secs: u64,
    /// Failed cycles after which an unreachable request is rejected.
    pub retry_budget: u32,
    pub trigger: OptimizationTrigger,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            nearest_vehicles_limit: 40,
            nearest_requests_limit: 40,
            bucket_width_secs:      TimeDiscretizer::DEFAULT_WIDTH_SECS,
            bucket_count:           TimeDiscretizer::DEFAULT_COUNT,
            cyclic_buckets:         false,
            diversion_allowed:      false,
            destination_known:      true,
            objective:              ObjectiveKind::MinWaitTime,
            pickup_duration_secs:   120,
            dropoff_duration_secs:  60,
            retry_budget:           3,
            trigger:                OptimizationTrigger::EveryTick,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> DispatchResult<()> {
        let positive = [
            ("nearest_vehicles_limit", self.nearest_vehicles_limit as u64),
            ("nearest_requests_limit", self.nearest_requests_limit as u64),
            ("bucket_width_secs", self.bucket_width_secs),
            ("bucket_count", self.bucket_count as u64),
            ("retry_budget", self.retry_budget as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(DispatchError::Config(format!("{name} must be > 0")));
            }
        }
        if self.trigger == OptimizationTrigger::EveryNTicks(0) {
            return Err(DispatchError::Config("every_n_ticks must be > 0".into()));
        }
        Ok(())
    }

    pub fn policy(&self) -> DiversionPolicy {
        DiversionPolicy {
            destination_known: self.destination_known,
            diversion_allowed: self.diversion_allowed,
        }
    }

    pub fn discretizer(&self) -> TimeDiscretizer {
        TimeDiscretizer::new(self.bucket_width_secs, self.bucket_count, self.cyclic_buckets)
    }
}
