//! Time-discretized path cache.
//!
//! Entries are keyed by `(from, to, bucket)` and computed with the bucket's
//! start as departure time, so every query inside one bucket returns the very
//! same `Arc<Route>`.  The cache is unbounded and lives for one run; call
//! [`PathCache::reset`] at run start.
//!
//! Unreachable pairs are remembered per pair regardless of bucket: a static
//! graph that has no path at 08:00 has none at 17:00 either.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use dvrp_core::{NodeId, SimTime};

use crate::discretizer::TimeDiscretizer;
use crate::oracle::{PathCost, PathCostOracle};
use crate::router::{Route, Router};
use crate::{SpatialError, SpatialResult};

/// Cache key: origin, destination and time bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub from:   NodeId,
    pub to:     NodeId,
    pub bucket: u32,
}

/// Lookup counters, cumulative since the last reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStats {
    pub hits:        u64,
    pub misses:      u64,
    /// Queries answered `NoPath` from the negative cache.
    pub unreachable: u64,
}

pub struct PathCache {
    discretizer: TimeDiscretizer,
    entries:     FxHashMap<PathKey, Arc<Route>>,
    unreachable: FxHashSet<(NodeId, NodeId)>,
    stats:       CacheStats,
}

impl PathCache {
    pub fn new(discretizer: TimeDiscretizer) -> Self {
        Self {
            discretizer,
            entries:     FxHashMap::default(),
            unreachable: FxHashSet::default(),
            stats:       CacheStats::default(),
        }
    }

    pub fn discretizer(&self) -> &TimeDiscretizer {
        &self.discretizer
    }

    pub fn key(&self, from: NodeId, to: NodeId, time: SimTime) -> PathKey {
        PathKey { from, to, bucket: self.discretizer.bucket(time) }
    }

    /// Cached path for a departure at `time`, computing it on a miss.
    pub fn get<R: Router>(
        &mut self,
        oracle: &PathCostOracle<R>,
        from: NodeId,
        to: NodeId,
        time: SimTime,
    ) -> SpatialResult<Arc<Route>> {
        if self.unreachable.contains(&(from, to)) {
            self.stats.unreachable += 1;
            return Err(SpatialError::NoPath { from, to });
        }

        let key = self.key(from, to, time);
        if let Some(route) = self.entries.get(&key) {
            self.stats.hits += 1;
            return Ok(Arc::clone(route));
        }

        self.stats.misses += 1;
        let departure = self.discretizer.bucket_start(key.bucket);
        trace!(%from, %to, bucket = key.bucket, "path cache miss");
        let computed = oracle.calc_path(from, to, departure);
        self.store(key, computed)
    }

    /// Travel time and cost for a departure at `time`.
    pub fn cost<R: Router>(
        &mut self,
        oracle: &PathCostOracle<R>,
        from: NodeId,
        to: NodeId,
        time: SimTime,
    ) -> SpatialResult<PathCost> {
        self.get(oracle, from, to, time).map(|r| PathCost::from(r.as_ref()))
    }

    /// Compute every missing entry of `queries` up front.
    ///
    /// With the `parallel` feature the misses are routed on Rayon's pool; the
    /// results are inserted in input order either way, so the cache ends up
    /// identical to issuing the same `get` calls one by one.
    pub fn prefetch<R: Router>(
        &mut self,
        oracle: &PathCostOracle<R>,
        queries: &[(NodeId, NodeId, SimTime)],
    ) {
        let mut seen: FxHashSet<PathKey> = FxHashSet::default();
        let missing: Vec<PathKey> = queries
            .iter()
            .map(|&(from, to, time)| self.key(from, to, time))
            .filter(|k| {
                !self.entries.contains_key(k)
                    && !self.unreachable.contains(&(k.from, k.to))
                    && seen.insert(*k)
            })
            .collect();
        if missing.is_empty() {
            return;
        }
        trace!(count = missing.len(), "path cache prefetch");

        let disc = self.discretizer;
        let compute = |k: &PathKey| oracle.calc_path(k.from, k.to, disc.bucket_start(k.bucket));

        #[cfg(feature = "parallel")]
        let results: Vec<SpatialResult<Route>> = {
            use rayon::prelude::*;
            missing.par_iter().map(compute).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let results: Vec<SpatialResult<Route>> = missing.iter().map(compute).collect();

        for (key, result) in missing.into_iter().zip(results) {
            if self.unreachable.contains(&(key.from, key.to)) {
                continue;
            }
            self.stats.misses += 1;
            // Errors are recorded in the negative cache; callers see them on
            // their own `get`.
            let _ = self.store(key, result);
        }
    }

    fn store(&mut self, key: PathKey, computed: SpatialResult<Route>) -> SpatialResult<Arc<Route>> {
        match computed {
            Ok(route) => {
                let route = Arc::new(route);
                self.entries.insert(key, Arc::clone(&route));
                Ok(route)
            }
            Err(err @ SpatialError::NoPath { .. }) => {
                self.unreachable.insert((key.from, key.to));
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Drop every entry and counter.  Called at run start.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.unreachable.clear();
        self.stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unreachable_pairs(&self) -> usize {
        self.unreachable.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(TimeDiscretizer::default())
    }
}
