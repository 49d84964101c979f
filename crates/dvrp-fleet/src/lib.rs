//! `dvrp-fleet`: vehicles, requests and their owners.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`vehicle`]  | `Vehicle` (owns its `Schedule`), `Fleet`                  |
//! | [`builder`]  | `FleetBuilder`, `VehicleSpec`                             |
//! | [`request`]  | `Request`, `NewRequest`, `RequestStatus`                  |
//! | [`registry`] | `RequestRegistry` (owner of requests, unplanned queue)    |
//! | [`loader`]   | `load_vehicles_csv`, `load_requests_csv` (+ `_reader`)    |
//! | [`error`]    | `FleetError`, `FleetResult<T>`                            |
//!
//! Tasks refer to requests by `RequestId` only; the registry is the single
//! owner and the only place request status changes.

pub mod builder;
pub mod error;
pub mod loader;
pub mod registry;
pub mod request;
pub mod vehicle;


pub use builder::{FleetBuilder, VehicleSpec};
pub use error::{FleetError, FleetResult};
pub use loader::{load_requests_csv, load_requests_reader, load_vehicles_csv, load_vehicles_reader};
pub use registry::RequestRegistry;
pub use request::{NewRequest, Request, RequestStatus};
pub use vehicle::{Fleet, Vehicle};
