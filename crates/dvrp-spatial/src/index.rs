//! `PointIndex<T>`: an R-tree over 2-D points with deterministic nearest-K.
//!
//! `rstar` yields neighbours in non-decreasing distance order but leaves the
//! order of equidistant points unspecified.  Dispatch decisions must be
//! reproducible, so every entry remembers its **insertion order** and
//! [`PointIndex::nearest_k`] breaks distance ties by it (first inserted wins).
//!
//! The query keeps pulling neighbours past the K-th one until the distance
//! strictly grows, then sorts by `(distance, order)`.  The result is exactly
//! what a full stable sort of all points truncated to K would give, at R-tree
//! cost.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use dvrp_core::GeoPoint;

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// A `[lat, lon]` point with its insertion order and payload.
#[derive(Clone)]
struct IndexedPoint<T> {
    point: [f32; 2],
    order: u32,
    item:  T,
}

impl<T> RTreeObject for IndexedPoint<T> {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl<T> PointDistance for IndexedPoint<T> {
    /// Squared planar distance in lat/lon space (see
    /// [`GeoPoint::planar_distance_2`]).
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── PointIndex ────────────────────────────────────────────────────────────────

/// Bulk-loaded spatial index of `(GeoPoint, T)` pairs.
pub struct PointIndex<T> {
    tree: RTree<IndexedPoint<T>>,
}

impl<T: Copy> PointIndex<T> {
    /// Bulk-load the index in O(N log N).  Iteration order of `items` is the
    /// insertion order used for tie-breaking.
    pub fn bulk_load<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (GeoPoint, T)>,
    {
        let entries: Vec<IndexedPoint<T>> = items
            .into_iter()
            .enumerate()
            .map(|(i, (pos, item))| IndexedPoint {
                point: pos.to_array(),
                order: i as u32,
                item,
            })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// The closest item to `pos` (ties → first inserted), or `None` if empty.
    pub fn nearest(&self, pos: GeoPoint) -> Option<T> {
        self.nearest_k(pos, 1).into_iter().next()
    }

    /// Up to `k` items sorted by ascending distance to `pos`, ties broken by
    /// insertion order.
    pub fn nearest_k(&self, pos: GeoPoint, k: usize) -> Vec<T> {
        if k == 0 {
            return Vec::new();
        }

        // Distances arrive in non-decreasing order, so once we hold k hits
        // the k-th distance is the cut-off; anything equal to it may still
        // win on insertion order.
        let mut hits: Vec<(f32, u32, T)> = Vec::with_capacity(k);
        for (entry, d2) in self.tree.nearest_neighbor_iter_with_distance_2(&pos.to_array()) {
            if hits.len() >= k && d2 > hits[k - 1].0 {
                break;
            }
            hits.push((d2, entry.order, entry.item));
        }

        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.truncate(k);
        hits.into_iter().map(|(_, _, item)| item).collect()
    }
}
