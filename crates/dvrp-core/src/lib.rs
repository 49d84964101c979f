//! `dvrp-core`: foundational types for the `dvrp` fleet-dispatch workspace.
//!
//! This crate is a dependency of every other `dvrp-*` crate.  It has no
//! `dvrp-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `VehicleId`, `RequestId`, `NodeId`, `EdgeId`          |
//! | [`geo`]         | `GeoPoint`, haversine and planar distances            |
//! | [`time`]        | `SimTime`, `SimClock`, `SimConfig`                    |
//! | [`rng`]         | `SimRng` (seeded, reproducible)                       |
//! | [`error`]       | `DvrpError`, `DvrpResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DvrpError, DvrpResult};
pub use geo::GeoPoint;
pub use ids::{EdgeId, NodeId, RequestId, VehicleId};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, SimTime};
