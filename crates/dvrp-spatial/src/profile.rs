//! Time-of-day travel time profile.
//!
//! The road graph stores free-flow edge times.  Congestion is modelled as a
//! piecewise-constant multiplier over the day: the factor for the period
//! containing the **departure time** is applied to every edge of the query.
//! A single factor per query (rather than per edge) keeps the router
//! deterministic and lets the path cache reason about one representative
//! time per bucket.

use dvrp_core::SimTime;

/// Piecewise-constant multiplier on free-flow travel times.
///
/// Period `i` covers `[i * period_secs, (i + 1) * period_secs)`.  Times past
/// the last period use the last factor; an empty profile is free flow.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TravelTimeProfile {
    period_secs: u64,
    factors:     Vec<f32>,
}

impl TravelTimeProfile {
    /// Factor 1.0 at all times.
    pub fn free_flow() -> Self {
        Self { period_secs: 1, factors: Vec::new() }
    }

    /// Build a profile from per-period factors.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `period_secs == 0` or any factor is not
    /// strictly positive.
    pub fn new(period_secs: u64, factors: Vec<f32>) -> Self {
        debug_assert!(period_secs > 0, "period_secs must be > 0");
        debug_assert!(factors.iter().all(|f| *f > 0.0), "factors must be > 0");
        Self { period_secs: period_secs.max(1), factors }
    }

    /// Multiplier for a trip departing at `time`.
    pub fn factor_at(&self, time: SimTime) -> f32 {
        match self.factors.len() {
            0 => 1.0,
            n => {
                let idx = ((time.0 / self.period_secs) as usize).min(n - 1);
                self.factors[idx]
            }
        }
    }

    pub fn is_free_flow(&self) -> bool {
        self.factors.iter().all(|f| *f == 1.0)
    }
}

impl Default for TravelTimeProfile {
    fn default() -> Self {
        Self::free_flow()
    }
}
