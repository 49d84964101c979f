//! Simulation observer trait for progress reporting and data collection.

use dvrp_core::SimTime;
use dvrp_dispatch::{CycleReport, DispatchError, DispatchEvent};
use dvrp_fleet::NewRequest;

use crate::SimSummary;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: rejection counter
///
/// ```rust,ignore
/// struct Rejections(usize);
///
/// impl SimObserver for Rejections {
///     fn on_event(&mut self, event: &DispatchEvent) {
///         if matches!(event, DispatchEvent::RequestRejected { .. }) {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _now: SimTime) {}

    /// Called after every optimizer cycle that actually ran.
    fn on_cycle(&mut self, _now: SimTime, _report: &CycleReport) {}

    /// Called when the optimizer refuses a due request, e.g. one naming a
    /// node outside the network.  The request is not registered.
    fn on_request_dropped(&mut self, _request: &NewRequest, _error: &DispatchError) {}

    /// Called once per dispatch event, in publication order.
    fn on_event(&mut self, _event: &DispatchEvent) {}

    /// Called at the end of each tick.  `woken` is the number of vehicles
    /// whose wake time was due this tick.
    fn on_tick_end(&mut self, _now: SimTime, _woken: usize) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _now: SimTime, _summary: &SimSummary) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
