//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The oracle calls routing via the [`Router`] trait, so applications can
//! swap in custom implementations (contraction hierarchies, A*) without
//! touching dispatch.  The default [`DijkstraRouter`] minimises travel time;
//! [`RouteMetric::Distance`] makes it minimise driven distance instead.
//!
//! # Units
//!
//! Edge weights are milliseconds internally.  A [`Route`] exposes whole
//! seconds: each node's arrival offset is the **ceiling** of the cumulative
//! milliseconds, so a vehicle never arrives before the correct second.
//! Travel cost is the driven distance in metres.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use dvrp_core::{EdgeId, NodeId, SimTime};

use crate::network::RoadNetwork;
use crate::profile::TravelTimeProfile;
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query.
///
/// `nodes` always has one more element than `edges`; a trivial route (origin
/// equals destination) has a single node and no edges.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Nodes visited in order, origin first.
    pub nodes: Vec<NodeId>,
    /// Edges traversed in order.
    pub edges: Vec<EdgeId>,
    /// Arrival offset in seconds at each node, relative to departure.
    /// `node_offsets_secs[0] == 0`, non-decreasing.
    pub node_offsets_secs: Vec<u64>,
    /// Cumulative distance in metres at each node.
    pub node_distances_m: Vec<f64>,
    /// Total travel time in seconds (the last node offset).
    pub travel_time_secs: u64,
    /// Total driven distance in metres.
    pub travel_cost: f64,
}

impl Route {
    /// A zero-length route that stays at `node`.
    pub fn trivial(node: NodeId) -> Self {
        Self {
            nodes:             vec![node],
            edges:             Vec::new(),
            node_offsets_secs: vec![0],
            node_distances_m:  vec![0.0],
            travel_time_secs:  0,
            travel_cost:       0.0,
        }
    }

    pub fn from(&self) -> NodeId {
        self.nodes.first().copied().unwrap_or(NodeId::INVALID)
    }

    pub fn to(&self) -> NodeId {
        self.nodes.last().copied().unwrap_or(NodeId::INVALID)
    }

    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// First node reached at or after `elapsed_secs` since departure.
    ///
    /// Returns `(position in nodes, node, offset)`.  Past the end of the
    /// route this is the destination.
    pub fn first_node_at_or_after(&self, elapsed_secs: u64) -> (usize, NodeId, u64) {
        let idx = self
            .node_offsets_secs
            .partition_point(|&off| off < elapsed_secs)
            .min(self.nodes.len().saturating_sub(1));
        (idx, self.nodes[idx], self.node_offsets_secs[idx])
    }

    /// The route cut after node position `idx` (inclusive).
    ///
    /// `prefix(0)` is a trivial route at the origin.
    pub fn prefix(&self, idx: usize) -> Route {
        let idx = idx.min(self.nodes.len().saturating_sub(1));
        Route {
            nodes:             self.nodes[..=idx].to_vec(),
            edges:             self.edges[..idx].to_vec(),
            node_offsets_secs: self.node_offsets_secs[..=idx].to_vec(),
            node_distances_m:  self.node_distances_m[..=idx].to_vec(),
            travel_time_secs:  self.node_offsets_secs[idx],
            travel_cost:       self.node_distances_m[idx],
        }
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so they can be shared across Rayon
/// worker threads during a parallel cache prefetch.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to` departing at `departure`.
    ///
    /// `from == to` is an empty route, never an error.  Unknown nodes fail
    /// with [`SpatialError::NodeNotFound`], unreachable destinations with
    /// [`SpatialError::NoPath`].
    fn route(
        &self,
        network: &RoadNetwork,
        from: NodeId,
        to: NodeId,
        departure: SimTime,
    ) -> SpatialResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// The quantity [`DijkstraRouter`] minimises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RouteMetric {
    /// Profile-scaled travel time.
    #[default]
    TravelTime,
    /// Driven distance.  Arrival offsets are still travel times.
    Distance,
}

/// Standard Dijkstra's algorithm over the CSR road graph.
///
/// Edge weight is `edge_travel_ms` scaled by the profile factor at the
/// departure time, or the edge length in millimetres under
/// [`RouteMetric::Distance`].  Heap ties are broken by `NodeId`, so
/// equal-weight alternatives always resolve the same way.
#[derive(Debug, Clone, Default)]
pub struct DijkstraRouter {
    profile: TravelTimeProfile,
    metric:  RouteMetric,
}

impl DijkstraRouter {
    /// Free-flow router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Router that applies `profile` to every query.
    pub fn with_profile(profile: TravelTimeProfile) -> Self {
        Self { profile, ..Self::default() }
    }

    /// Minimise `metric` instead of travel time.
    pub fn with_metric(mut self, metric: RouteMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn profile(&self) -> &TravelTimeProfile {
        &self.profile
    }

    pub fn metric(&self) -> RouteMetric {
        self.metric
    }
}

impl Router for DijkstraRouter {
    fn route(
        &self,
        network: &RoadNetwork,
        from: NodeId,
        to: NodeId,
        departure: SimTime,
    ) -> SpatialResult<Route> {
        for node in [from, to] {
            if !network.contains(node) {
                return Err(SpatialError::NodeNotFound(node));
            }
        }
        dijkstra(network, from, to, self.metric, self.profile.factor_at(departure))
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[inline]
fn edge_cost_ms(network: &RoadNetwork, edge: EdgeId, factor: f32) -> u64 {
    let free = network.edge_travel_ms[edge.index()] as f64;
    (free * factor as f64).ceil() as u64
}

#[inline]
fn edge_weight(network: &RoadNetwork, edge: EdgeId, metric: RouteMetric, factor: f32) -> u64 {
    match metric {
        RouteMetric::TravelTime => edge_cost_ms(network, edge, factor),
        RouteMetric::Distance => (network.edge_length_m[edge.index()] as f64 * 1_000.0).round() as u64,
    }
}

fn dijkstra(
    network: &RoadNetwork,
    from: NodeId,
    to: NodeId,
    metric: RouteMetric,
    factor: f32,
) -> SpatialResult<Route> {
    if from == to {
        return Ok(Route::trivial(from));
    }

    let n = network.node_count();
    let mut dist      = vec![u64::MAX; n];
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0;

    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_edge, from, to, factor));
        }

        // Stale heap entry.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost.saturating_add(edge_weight(network, edge, metric, factor));

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    Err(SpatialError::NoPath { from, to })
}

fn reconstruct(
    network: &RoadNetwork,
    prev_edge: &[EdgeId],
    from: NodeId,
    to: NodeId,
    factor: f32,
) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();

    let mut nodes   = Vec::with_capacity(edges.len() + 1);
    let mut offsets = Vec::with_capacity(edges.len() + 1);
    let mut dists   = Vec::with_capacity(edges.len() + 1);
    let mut cum_ms  = 0u64;
    let mut metres  = 0.0f64;
    nodes.push(from);
    offsets.push(0);
    dists.push(0.0);
    for &e in &edges {
        cum_ms += edge_cost_ms(network, e, factor);
        metres += network.edge_length_m[e.index()] as f64;
        nodes.push(network.edge_to[e.index()]);
        offsets.push(cum_ms.div_ceil(1000));
        dists.push(metres);
    }

    Route {
        travel_time_secs:  offsets.last().copied().unwrap_or(0),
        nodes,
        edges,
        node_offsets_secs: offsets,
        node_distances_m:  dists,
        travel_cost:       metres,
    }
}
