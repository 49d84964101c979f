//! Departure time → cache bucket.

use dvrp_core::SimTime;

/// Fixed-width time buckets.
///
/// A non-cyclic discretizer clamps times past the last bucket into it; a
/// cyclic one wraps modulo `bucket_count` (for profiles that repeat daily).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeDiscretizer {
    bucket_width_secs: u64,
    bucket_count:      u32,
    cyclic:            bool,
}

impl TimeDiscretizer {
    /// 124 buckets of 15 minutes: a 31-hour horizon.
    pub const DEFAULT_WIDTH_SECS: u64 = 15 * 60;
    pub const DEFAULT_COUNT: u32 = 31 * 4;

    /// # Panics
    ///
    /// Panics in debug mode if width or count is zero.  Both are clamped to 1
    /// in release builds; validated configs never hit this.
    pub fn new(bucket_width_secs: u64, bucket_count: u32, cyclic: bool) -> Self {
        debug_assert!(bucket_width_secs > 0, "bucket width must be > 0");
        debug_assert!(bucket_count > 0, "bucket count must be > 0");
        Self {
            bucket_width_secs: bucket_width_secs.max(1),
            bucket_count:      bucket_count.max(1),
            cyclic,
        }
    }

    pub fn bucket_width_secs(&self) -> u64 { self.bucket_width_secs }
    pub fn bucket_count(&self) -> u32 { self.bucket_count }
    pub fn is_cyclic(&self) -> bool { self.cyclic }

    /// Bucket index of `time`, always in `[0, bucket_count)`.
    pub fn bucket(&self, time: SimTime) -> u32 {
        let raw = time.0 / self.bucket_width_secs;
        let count = self.bucket_count as u64;
        if self.cyclic {
            (raw % count) as u32
        } else {
            raw.min(count - 1) as u32
        }
    }

    /// Start of bucket `bucket`; the representative departure time used for
    /// every query that falls in it.
    pub fn bucket_start(&self, bucket: u32) -> SimTime {
        SimTime(bucket.min(self.bucket_count - 1) as u64 * self.bucket_width_secs)
    }

    /// Shorthand for `bucket_start(bucket(time))`.
    pub fn representative_time(&self, time: SimTime) -> SimTime {
        self.bucket_start(self.bucket(time))
    }
}

impl Default for TimeDiscretizer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH_SECS, Self::DEFAULT_COUNT, false)
    }
}
