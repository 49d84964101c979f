//! Request demand: a time-ordered feed and a seeded synthetic generator.

use std::collections::VecDeque;

use dvrp_core::{NodeId, SimRng, SimTime};
use dvrp_fleet::NewRequest;

/// Requests waiting for their submission time.
#[derive(Clone, Debug, Default)]
pub struct DemandFeed {
    pending: VecDeque<NewRequest>,
}

impl DemandFeed {
    /// Stable-sorts `requests` by submission time.
    pub fn new(mut requests: Vec<NewRequest>) -> Self {
        requests.sort_by_key(|r| r.submitted);
        Self { pending: requests.into() }
    }

    /// Insert after every request submitted at or before `request`.
    pub fn push(&mut self, request: NewRequest) {
        let at = self.pending.partition_point(|r| r.submitted <= request.submitted);
        self.pending.insert(at, request);
    }

    /// Remove and return every request submitted at or before `now`.
    pub fn pop_due(&mut self, now: SimTime) -> Vec<NewRequest> {
        let n = self.pending.partition_point(|r| r.submitted <= now);
        self.pending.drain(..n).collect()
    }

    pub fn next_time(&self) -> Option<SimTime> {
        self.pending.front().map(|r| r.submitted)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// `count` immediate requests between random distinct nodes, submitted
/// uniformly in `[start, end)`.  Sorted by submission time.
pub fn random_requests(
    rng: &mut SimRng,
    node_count: usize,
    count: usize,
    start: SimTime,
    end: SimTime,
) -> Vec<NewRequest> {
    if node_count < 2 || end <= start {
        return Vec::new();
    }
    let mut requests: Vec<NewRequest> = (0..count)
        .map(|_| {
            let from = rng.gen_range(0..node_count as u32);
            // Skip over `from` so origin and destination differ.
            let mut to = rng.gen_range(0..node_count as u32 - 1);
            if to >= from {
                to += 1;
            }
            let submitted = SimTime(rng.gen_range(start.0..end.0));
            NewRequest { from: NodeId(from), to: NodeId(to), t0: submitted, submitted }
        })
        .collect();
    requests.sort_by_key(|r| r.submitted);
    requests
}
