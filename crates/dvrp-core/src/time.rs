//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing count of simulated **seconds**
//! (`SimTime`).  Using an integer as the canonical time unit means all
//! schedule arithmetic is exact (no floating-point drift), and the schedule
//! continuity invariant `task[i].end == task[i+1].begin` can be checked with
//! `==`.
//!
//! The tick adapter advances a `SimClock` in fixed increments of
//! `tick_duration_secs` (typically 1 simulated second per tick):
//!
//!   now = start + ticks_elapsed * tick_duration_secs

use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulation time in seconds since the start of the day/run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Sentinel for "no time limit" (e.g. a vehicle without a shift end).
    pub const MAX: SimTime = SimTime(u64::MAX);

    /// Return the time `secs` seconds after `self`.
    #[inline]
    pub fn offset(self, secs: u64) -> SimTime {
        SimTime(self.0.saturating_add(secs))
    }

    /// Seconds elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0 - earlier.0
    }

    /// Seconds elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub fn saturating_since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: u64) -> SimTime {
        self.offset(rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: SimTime) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        write!(f, "{:02}:{:02}:{:02}", s / 3_600, (s % 3_600) / 60, s % 60)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the simulated clock of one run.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Simulated time of tick 0.
    pub start: SimTime,
    /// How many simulated seconds one tick represents.  Default: 1.
    pub tick_duration_secs: u32,
    /// Ticks completed so far, advanced by `SimClock::advance()`.
    pub ticks_elapsed: u64,
}

impl SimClock {
    /// Create a clock starting at `start` with the given resolution.
    pub fn new(start: SimTime, tick_duration_secs: u32) -> Self {
        Self { start, tick_duration_secs, ticks_elapsed: 0 }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.ticks_elapsed += 1;
    }

    /// The current simulated time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.start.offset(self.elapsed_secs())
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> u64 {
        self.ticks_elapsed * self.tick_duration_secs as u64
    }

    /// Break elapsed time into (day, hour, minute) components from the start.
    /// Useful for human-readable logging without a datetime library.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = self.elapsed_secs();
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        (days, hours, minutes)
    }

    /// How many ticks span `secs` seconds? (rounds up so no event is early)
    #[inline]
    pub fn ticks_for_secs(&self, secs: u64) -> u64 {
        secs.div_ceil(self.tick_duration_secs as u64)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "{} (day {} {:02}:{:02})", self.now(), d, h, m)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration for the tick adapter.
///
/// Typically loaded from a JSON file by the application crate and passed to
/// the simulation runner.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Simulated time of tick 0.
    pub start_time: SimTime,

    /// Seconds per tick.  Default: 1.
    pub tick_duration_secs: u32,

    /// Total ticks to simulate.  For one day at 1 s/tick: 86 400.
    pub total_ticks: u64,

    /// Master RNG seed for synthetic demand.  The dispatch core itself is
    /// deterministic and draws no random numbers.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_time:         SimTime::ZERO,
            tick_duration_secs: 1,
            total_ticks:        86_400,
            seed:               42,
        }
    }
}

impl SimConfig {
    /// The simulated time at which the run ends (exclusive upper bound).
    #[inline]
    pub fn end_time(&self) -> SimTime {
        self.start_time
            .offset(self.total_ticks.saturating_mul(self.tick_duration_secs as u64))
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_time, self.tick_duration_secs)
    }

    /// Reject configurations the tick loop cannot run.
    pub fn validate(&self) -> crate::DvrpResult<()> {
        if self.tick_duration_secs == 0 {
            return Err(crate::DvrpError::Config(
                "tick_duration_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}
