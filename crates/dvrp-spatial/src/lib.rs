//! `dvrp-spatial`: road network, spatial indexing, routing and path caching.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`network`]     | `RoadNetwork` (CSR + R-tree), `RoadNetworkBuilder`          |
//! | [`index`]       | `PointIndex<T>`: R-tree with stable nearest-K queries      |
//! | [`profile`]     | `TravelTimeProfile`: time-of-day travel time multipliers   |
//! | [`router`]      | `Router` trait, `Route`, `DijkstraRouter`, `RouteMetric`    |
//! | [`oracle`]      | `PathCostOracle<R>`, `PathCost`                             |
//! | [`discretizer`] | `TimeDiscretizer`: departure time → cache bucket           |
//! | [`cache`]       | `PathCache`, `CacheStats`                                   |
//! | [`error`]       | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Query path
//!
//! ```text
//! PathCache::get(from, to, t)
//!   bucket = discretizer.bucket(t)
//!   hit  → Arc<Route>
//!   miss → oracle.calc_path(from, to, discretizer.bucket_start(bucket))
//!            → Router::route(network, from, to, departure)
//! ```
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | `PathCache::prefetch` computes misses on Rayon's pool.    |
//! | `serde`    | Derives `Serialize`/`Deserialize` on public types.        |

pub mod cache;
pub mod discretizer;
pub mod error;
pub mod index;
pub mod network;
pub mod oracle;
pub mod profile;
pub mod router;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, PathCache, PathKey};
pub use discretizer::TimeDiscretizer;
pub use error::{SpatialError, SpatialResult};
pub use index::PointIndex;
pub use network::{RoadNetwork, RoadNetworkBuilder};
pub use oracle::{PathCost, PathCostOracle};
pub use profile::TravelTimeProfile;
pub use router::{DijkstraRouter, Route, RouteMetric, Router};
