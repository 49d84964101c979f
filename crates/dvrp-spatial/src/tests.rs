//! Unit tests for dvrp-spatial.
//!
//! All tests use hand-crafted networks.

#[cfg(test)]
mod helpers {
    use dvrp_core::{GeoPoint, NodeId};
    use crate::{RoadNetwork, RoadNetworkBuilder};

    /// Nodes (lat, lon):
    ///   0:(0,0)  1:(0,1)  2:(0,2)
    ///   3:(1,0)           4:(1,2)
    ///
    /// Undirected edges: 0-1, 1-2, 0-3, 2-4, 3-4
    ///
    /// 0→1→2→4 takes 30 s over 300 m, 0→3→4 takes 60 s over 600 m.
    pub fn ring_network() -> (RoadNetwork, [NodeId; 5]) {
        let mut b = RoadNetworkBuilder::new();
        let n0 = b.add_node(GeoPoint::new(0.0, 0.0));
        let n1 = b.add_node(GeoPoint::new(0.0, 1.0));
        let n2 = b.add_node(GeoPoint::new(0.0, 2.0));
        let n3 = b.add_node(GeoPoint::new(1.0, 0.0));
        let n4 = b.add_node(GeoPoint::new(1.0, 2.0));

        b.add_road(n0, n1, 100.0, 10_000);
        b.add_road(n1, n2, 100.0, 10_000);
        b.add_road(n2, n4, 100.0, 10_000);
        b.add_road(n0, n3, 500.0, 50_000);
        b.add_road(n3, n4, 100.0, 10_000);

        (b.build(), [n0, n1, n2, n3, n4])
    }

    /// Two components: {0, 1} and the isolated node 2.
    pub fn split_network() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_node(GeoPoint::new(5.0, 5.0));
        b.add_road(a, c, 100.0, 10_000);
        b.build()
    }
}

// ── Builder & network structure ────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use dvrp_core::{GeoPoint, NodeId};
    use crate::RoadNetworkBuilder;

    #[test]
    fn empty_build() {
        let net = RoadNetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert!(net.is_empty());
        assert!(net.snap_to_node(GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn csr_out_edges() {
        let (net, [n0, n1, _, n3, n4]) = super::helpers::ring_network();
        assert_eq!(net.out_degree(n0), 2);
        assert_eq!(net.out_degree(n1), 2);
        assert_eq!(net.out_degree(n3), 2);
        for e in net.out_edges(n4) {
            assert_eq!(net.edge_from[e.index()], n4);
        }
        assert_eq!(net.edge_count(), 10);
    }

    #[test]
    fn grid_layout() {
        let net = RoadNetworkBuilder::grid(GeoPoint::new(0.0, 0.0), 3, 4, 0.01, 100.0, 10_000).build();
        assert_eq!(net.node_count(), 12);
        // 3 rows × 3 horizontal + 2 × 4 vertical roads, both directions.
        assert_eq!(net.edge_count(), 2 * (9 + 8));
        assert_eq!(net.out_degree(NodeId(0)), 2);
        assert_eq!(net.out_degree(NodeId(5)), 4);
    }

    #[test]
    fn contains_and_position() {
        let (net, [n0, ..]) = super::helpers::ring_network();
        assert!(net.contains(n0));
        assert!(!net.contains(NodeId(99)));
        assert_eq!(net.position(n0), Some(GeoPoint::new(0.0, 0.0)));
        assert_eq!(net.position(NodeId(99)), None);
    }

    #[test]
    fn snap_to_nearest_node() {
        let (net, [_, n1, _, _, n4]) = super::helpers::ring_network();
        assert_eq!(net.snap_to_node(GeoPoint::new(0.1, 1.1)), Some(n1));
        assert_eq!(net.snap_to_node(GeoPoint::new(0.9, 2.2)), Some(n4));
    }
}

// ── Point index ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod index {
    use dvrp_core::GeoPoint;
    use crate::PointIndex;

    #[test]
    fn nearest_k_sorted_by_distance() {
        let idx = PointIndex::bulk_load([
            (GeoPoint::new(0.0, 3.0), 'c'),
            (GeoPoint::new(0.0, 1.0), 'a'),
            (GeoPoint::new(0.0, 2.0), 'b'),
        ]);
        assert_eq!(idx.nearest_k(GeoPoint::new(0.0, 0.0), 2), vec!['a', 'b']);
        assert_eq!(idx.nearest_k(GeoPoint::new(0.0, 0.0), 10), vec!['a', 'b', 'c']);
        assert!(idx.nearest_k(GeoPoint::new(0.0, 0.0), 0).is_empty());
    }

    #[test]
    fn ties_broken_by_insertion_order() {
        // Four points at distance 1 around the origin, inserted in a known
        // order, plus one farther away.
        let idx = PointIndex::bulk_load([
            (GeoPoint::new(0.0, 5.0), 9u32),
            (GeoPoint::new(1.0, 0.0), 3),
            (GeoPoint::new(0.0, -1.0), 1),
            (GeoPoint::new(-1.0, 0.0), 4),
            (GeoPoint::new(0.0, 1.0), 2),
        ]);
        let origin = GeoPoint::new(0.0, 0.0);
        assert_eq!(idx.nearest_k(origin, 1), vec![3]);
        assert_eq!(idx.nearest_k(origin, 2), vec![3, 1]);
        assert_eq!(idx.nearest_k(origin, 4), vec![3, 1, 4, 2]);
        assert_eq!(idx.nearest(origin), Some(3));
    }

    #[test]
    fn empty_index() {
        let idx: PointIndex<u8> = PointIndex::bulk_load(std::iter::empty());
        assert!(idx.is_empty());
        assert_eq!(idx.nearest(GeoPoint::new(0.0, 0.0)), None);
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod router {
    use dvrp_core::{NodeId, SimTime};
    use dvrp_core::GeoPoint;
    use crate::{DijkstraRouter, RoadNetworkBuilder, RouteMetric, Router, SpatialError, TravelTimeProfile};

    #[test]
    fn shortest_by_travel_time() {
        let (net, [n0, n1, n2, _, n4]) = super::helpers::ring_network();
        let route = DijkstraRouter::new().route(&net, n0, n4, SimTime::ZERO).unwrap();
        assert_eq!(route.nodes, vec![n0, n1, n2, n4]);
        assert_eq!(route.edges.len(), 3);
        assert_eq!(route.node_offsets_secs, vec![0, 10, 20, 30]);
        assert_eq!(route.travel_time_secs, 30);
        assert!((route.travel_cost - 300.0).abs() < 1e-9);
        assert_eq!(route.from(), n0);
        assert_eq!(route.to(), n4);
    }

    #[test]
    fn distance_metric_prefers_the_shorter_slower_road() {
        // 0→2 directly: 1 km in 10 s.  Via 1: 400 m in 60 s.
        let mut b = RoadNetworkBuilder::new();
        let n0 = b.add_node(GeoPoint::new(0.0, 0.0));
        let n1 = b.add_node(GeoPoint::new(0.0, 1.0));
        let n2 = b.add_node(GeoPoint::new(0.0, 2.0));
        b.add_road(n0, n2, 1_000.0, 10_000);
        b.add_road(n0, n1, 200.0, 30_000);
        b.add_road(n1, n2, 200.0, 30_000);
        let net = b.build();

        let fastest = DijkstraRouter::new().route(&net, n0, n2, SimTime::ZERO).unwrap();
        assert_eq!(fastest.nodes, vec![n0, n2]);
        assert_eq!(fastest.travel_time_secs, 10);

        let router = DijkstraRouter::new().with_metric(RouteMetric::Distance);
        assert_eq!(router.metric(), RouteMetric::Distance);
        let shortest = router.route(&net, n0, n2, SimTime::ZERO).unwrap();
        assert_eq!(shortest.nodes, vec![n0, n1, n2]);
        assert_eq!(shortest.node_offsets_secs, vec![0, 30, 60]);
        assert!((shortest.travel_cost - 400.0).abs() < 1e-9);
    }

    #[test]
    fn same_node_is_trivial() {
        let (net, [n0, ..]) = super::helpers::ring_network();
        let route = DijkstraRouter::new().route(&net, n0, n0, SimTime(500)).unwrap();
        assert!(route.is_trivial());
        assert_eq!(route.travel_time_secs, 0);
        assert_eq!(route.nodes, vec![n0]);
    }

    #[test]
    fn unreachable_is_no_path() {
        let net = super::helpers::split_network();
        let err = DijkstraRouter::new().route(&net, NodeId(0), NodeId(2), SimTime::ZERO).unwrap_err();
        assert_eq!(err, SpatialError::NoPath { from: NodeId(0), to: NodeId(2) });
    }

    #[test]
    fn unknown_node() {
        let (net, [n0, ..]) = super::helpers::ring_network();
        let err = DijkstraRouter::new().route(&net, n0, NodeId(77), SimTime::ZERO).unwrap_err();
        assert_eq!(err, SpatialError::NodeNotFound(NodeId(77)));
    }

    #[test]
    fn profile_scales_by_departure() {
        let (net, [n0, .., n4]) = super::helpers::ring_network();
        let router = DijkstraRouter::with_profile(TravelTimeProfile::new(3_600, vec![1.0, 2.0]));
        let off_peak = router.route(&net, n0, n4, SimTime(100)).unwrap();
        let peak     = router.route(&net, n0, n4, SimTime(3_700)).unwrap();
        assert_eq!(off_peak.travel_time_secs, 30);
        assert_eq!(peak.travel_time_secs, 60);
        // Past the last period the last factor holds.
        assert_eq!(router.route(&net, n0, n4, SimTime(99_999)).unwrap().travel_time_secs, 60);
    }

    #[test]
    fn offsets_round_up_to_whole_seconds() {
        use dvrp_core::GeoPoint;
        let mut b = crate::RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        let d = b.add_node(GeoPoint::new(0.0, 2.0));
        b.add_directed_edge(a, c, 10.0, 1_200);
        b.add_directed_edge(c, d, 10.0, 1_200);
        let net = b.build();
        let route = DijkstraRouter::new().route(&net, a, d, SimTime::ZERO).unwrap();
        assert_eq!(route.node_offsets_secs, vec![0, 2, 3]);
    }

    #[test]
    fn first_node_at_or_after_and_prefix() {
        let (net, [n0, n1, n2, _, n4]) = super::helpers::ring_network();
        let route = DijkstraRouter::new().route(&net, n0, n4, SimTime::ZERO).unwrap();
        assert_eq!(route.first_node_at_or_after(0), (0, n0, 0));
        assert_eq!(route.first_node_at_or_after(10), (1, n1, 10));
        assert_eq!(route.first_node_at_or_after(11), (2, n2, 20));
        assert_eq!(route.first_node_at_or_after(1_000), (3, n4, 30));

        let head = route.prefix(2);
        assert_eq!(head.nodes, vec![n0, n1, n2]);
        assert_eq!(head.edges.len(), 2);
        assert_eq!(head.travel_time_secs, 20);
        assert!((head.travel_cost - 200.0).abs() < 1e-9);
        assert!(route.prefix(0).is_trivial());
    }
}

// ── Oracle ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod oracle {
    use dvrp_core::SimTime;
    use crate::{PathCost, PathCostOracle};

    #[test]
    fn cost_matches_path() {
        let (net, [n0, .., n4]) = super::helpers::ring_network();
        let oracle = PathCostOracle::with_dijkstra(net);
        let cost = oracle.cost(n0, n4, SimTime::ZERO).unwrap();
        assert_eq!(cost, PathCost { travel_time_secs: 30, travel_cost: 300.0 });
        assert_eq!(oracle.network().node_count(), 5);
    }

    #[test]
    fn deterministic() {
        let (net, [n0, .., n4]) = super::helpers::ring_network();
        let oracle = PathCostOracle::with_dijkstra(net);
        let a = oracle.calc_path(n0, n4, SimTime(42)).unwrap();
        let b = oracle.calc_path(n0, n4, SimTime(42)).unwrap();
        assert_eq!(a, b);
    }
}

// ── Discretizer ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod discretizer {
    use dvrp_core::SimTime;
    use crate::TimeDiscretizer;

    #[test]
    fn clamps_past_last_bucket() {
        let d = TimeDiscretizer::new(900, 124, false);
        assert_eq!(d.bucket(SimTime(0)), 0);
        assert_eq!(d.bucket(SimTime(899)), 0);
        assert_eq!(d.bucket(SimTime(900)), 1);
        assert_eq!(d.bucket(SimTime(900 * 500)), 123);
        assert_eq!(d.bucket_start(3), SimTime(2_700));
    }

    #[test]
    fn cyclic_wraps() {
        let d = TimeDiscretizer::new(3_600, 24, true);
        assert_eq!(d.bucket(SimTime(25 * 3_600 + 5)), 1);
        assert_eq!(d.representative_time(SimTime(25 * 3_600 + 5)), SimTime(3_600));
    }

    #[test]
    fn default_is_31_hours_of_quarters() {
        let d = TimeDiscretizer::default();
        assert_eq!(d.bucket_width_secs(), 900);
        assert_eq!(d.bucket_count(), 124);
        assert!(!d.is_cyclic());
    }
}

// ── Path cache ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod cache {
    use std::sync::Arc;

    use dvrp_core::{NodeId, SimTime};
    use crate::{
        CacheStats, DijkstraRouter, PathCache, PathCostOracle, SpatialError, TimeDiscretizer,
        TravelTimeProfile,
    };

    fn peak_oracle() -> (PathCostOracle, [NodeId; 5]) {
        let (net, nodes) = super::helpers::ring_network();
        let router = DijkstraRouter::with_profile(TravelTimeProfile::new(900, vec![1.0, 2.0]));
        (PathCostOracle::new(net, router), nodes)
    }

    #[test]
    fn same_bucket_identical_next_bucket_may_differ() {
        let (oracle, [n0, .., n4]) = peak_oracle();
        let mut cache = PathCache::new(TimeDiscretizer::new(900, 124, false));

        let a = cache.get(&oracle, n0, n4, SimTime(10)).unwrap();
        let b = cache.get(&oracle, n0, n4, SimTime(899)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = cache.get(&oracle, n0, n4, SimTime(900)).unwrap();
        assert_eq!(a.travel_time_secs, 30);
        assert_eq!(c.travel_time_secs, 60);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 2, unreachable: 0 });
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn miss_uses_bucket_start() {
        // Profile switches at 600 s, inside the first 900 s bucket.  The
        // cache must route as of 0, not as of the query time.
        let (net, [n0, .., n4]) = super::helpers::ring_network();
        let router = DijkstraRouter::with_profile(TravelTimeProfile::new(600, vec![1.0, 3.0]));
        let oracle = PathCostOracle::new(net, router);
        let mut cache = PathCache::new(TimeDiscretizer::new(900, 4, false));
        let r = cache.get(&oracle, n0, n4, SimTime(700)).unwrap();
        assert_eq!(r.travel_time_secs, 30);
    }

    #[test]
    fn unreachable_pair_remembered_across_buckets() {
        let oracle = PathCostOracle::with_dijkstra(super::helpers::split_network());
        let mut cache = PathCache::default();
        let (a, z) = (NodeId(0), NodeId(2));

        let first = cache.get(&oracle, a, z, SimTime(0)).unwrap_err();
        assert_eq!(first, SpatialError::NoPath { from: a, to: z });
        let again = cache.get(&oracle, a, z, SimTime(50_000)).unwrap_err();
        assert_eq!(again, first);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.unreachable, 1);
        assert_eq!(cache.unreachable_pairs(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let (oracle, [n0, .., n4]) = peak_oracle();
        let mut cache = PathCache::default();
        cache.get(&oracle, n0, n4, SimTime(0)).unwrap();
        cache.reset();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn prefetch_fills_and_dedups() {
        let (oracle, [n0, n1, _, _, n4]) = peak_oracle();
        let mut cache = PathCache::default();
        cache.prefetch(&oracle, &[
            (n0, n4, SimTime(0)),
            (n0, n4, SimTime(100)),
            (n1, n4, SimTime(0)),
        ]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().misses, 2);

        let r = cache.get(&oracle, n0, n4, SimTime(5)).unwrap();
        assert_eq!(r.travel_time_secs, 30);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn prefetch_records_unreachable() {
        let oracle = PathCostOracle::with_dijkstra(super::helpers::split_network());
        let mut cache = PathCache::default();
        cache.prefetch(&oracle, &[(NodeId(0), NodeId(2), SimTime(0))]);
        assert_eq!(cache.unreachable_pairs(), 1);
        assert!(cache.get(&oracle, NodeId(0), NodeId(2), SimTime(0)).is_err());
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use std::sync::Arc;

    use proptest::prelude::*;

    use dvrp_core::{GeoPoint, NodeId, SimTime};
    use crate::{
        DijkstraRouter, PathCache, PathCostOracle, RoadNetworkBuilder, TimeDiscretizer,
        TravelTimeProfile,
    };

    fn grid_oracle() -> PathCostOracle {
        let net = RoadNetworkBuilder::grid(GeoPoint::new(0.0, 0.0), 4, 4, 0.01, 250.0, 20_000).build();
        let profile = TravelTimeProfile::new(1_800, vec![1.0, 1.5, 1.2, 2.0]);
        PathCostOracle::new(net, DijkstraRouter::with_profile(profile))
    }

    proptest! {
        #[test]
        fn same_bucket_same_route(
            from in 0u32..16,
            to in 0u32..16,
            bucket in 0u64..8,
            a in 0u64..900,
            b in 0u64..900,
        ) {
            let oracle = grid_oracle();
            let mut cache = PathCache::new(TimeDiscretizer::new(900, 124, false));
            let t_a = SimTime(bucket * 900 + a);
            let t_b = SimTime(bucket * 900 + b);
            let ra = cache.get(&oracle, NodeId(from), NodeId(to), t_a).unwrap();
            let rb = cache.get(&oracle, NodeId(from), NodeId(to), t_b).unwrap();
            prop_assert!(Arc::ptr_eq(&ra, &rb));

            // A fresh cache computes a bit-identical route.
            let mut fresh = PathCache::new(TimeDiscretizer::new(900, 124, false));
            let rc = fresh.get(&oracle, NodeId(from), NodeId(to), t_b).unwrap();
            prop_assert_eq!(ra.as_ref(), rc.as_ref());
        }

        #[test]
        fn offsets_are_monotone(from in 0u32..16, to in 0u32..16, t in 0u64..10_000) {
            let oracle = grid_oracle();
            let r = oracle.calc_path(NodeId(from), NodeId(to), SimTime(t)).unwrap();
            prop_assert_eq!(r.nodes.len(), r.edges.len() + 1);
            prop_assert!(r.node_offsets_secs.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(*r.node_offsets_secs.last().unwrap(), r.travel_time_secs);
        }
    }
}
