//! Path cost oracle: a road network bound to a router.

use dvrp_core::{NodeId, SimTime};

use crate::network::RoadNetwork;
use crate::router::{DijkstraRouter, Route, Router};
use crate::SpatialResult;

/// Travel time and travel cost of the best path between two nodes.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathCost {
    pub travel_time_secs: u64,
    /// Driven distance in metres.
    pub travel_cost: f64,
}

impl From<&Route> for PathCost {
    fn from(route: &Route) -> Self {
        Self {
            travel_time_secs: route.travel_time_secs,
            travel_cost:      route.travel_cost,
        }
    }
}

/// Answers "how long and how far from A to B when leaving at t".
///
/// Deterministic for a fixed network and router.  The oracle holds no state
/// of its own; memoization is the job of [`PathCache`](crate::PathCache).
pub struct PathCostOracle<R: Router = DijkstraRouter> {
    network: RoadNetwork,
    router:  R,
}

impl PathCostOracle<DijkstraRouter> {
    /// Oracle with a free-flow [`DijkstraRouter`].
    pub fn with_dijkstra(network: RoadNetwork) -> Self {
        Self::new(network, DijkstraRouter::new())
    }
}

impl<R: Router> PathCostOracle<R> {
    pub fn new(network: RoadNetwork, router: R) -> Self {
        Self { network, router }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Full path with per-node arrival offsets.
    pub fn calc_path(&self, from: NodeId, to: NodeId, departure: SimTime) -> SpatialResult<Route> {
        self.router.route(&self.network, from, to, departure)
    }

    /// Travel time and cost only.
    pub fn cost(&self, from: NodeId, to: NodeId, departure: SimTime) -> SpatialResult<PathCost> {
        self.calc_path(from, to, departure).map(|r| PathCost::from(&r))
    }
}
