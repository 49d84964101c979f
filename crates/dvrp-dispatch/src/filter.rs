//! Nearest-K candidate filter.
//!
//! Built once per cycle over the pool of eligible vehicles (keyed by their
//! departure node) or of unplanned requests (keyed by origin).  Items are
//! inserted in id order, so equidistant candidates come back lowest id first.

use dvrp_core::{NodeId, RequestId, VehicleId};
use dvrp_spatial::{PointIndex, RoadNetwork};

pub struct CandidateFilter<T> {
    index: PointIndex<T>,
}

impl<T: Copy> CandidateFilter<T> {
    /// Index `items` at their nodes' positions.  Items on nodes missing from
    /// `network` are skipped.
    pub fn new(network: &RoadNetwork, items: impl IntoIterator<Item = (T, NodeId)>) -> Self {
        let points = items
            .into_iter()
            .filter_map(|(item, node)| network.position(node).map(|pos| (pos, item)));
        Self { index: PointIndex::bulk_load(points) }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Up to `limit` items closest to `node`, nearest first.
    pub fn nearest(&self, network: &RoadNetwork, node: NodeId, limit: usize) -> Vec<T> {
        match network.position(node) {
            Some(pos) => self.index.nearest_k(pos, limit),
            None => Vec::new(),
        }
    }
}

impl CandidateFilter<VehicleId> {
    /// Vehicles nearest to a request's origin.
    pub fn nearest_vehicles(&self, network: &RoadNetwork, origin: NodeId, limit: usize) -> Vec<VehicleId> {
        self.nearest(network, origin, limit)
    }
}

impl CandidateFilter<RequestId> {
    /// Requests whose origin is nearest to a vehicle's departure node.
    pub fn nearest_requests(&self, network: &RoadNetwork, departure: NodeId, limit: usize) -> Vec<RequestId> {
        self.nearest(network, departure, limit)
    }
}
