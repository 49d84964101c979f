//! Fluent builder for a validated [`Fleet`].
//!
//! # Usage
//!
//! ```rust
//! use dvrp_core::{GeoPoint, NodeId, SimTime};
//! use dvrp_fleet::FleetBuilder;
//! use dvrp_spatial::RoadNetworkBuilder;
//!
//! let net = RoadNetworkBuilder::grid(GeoPoint::new(0.0, 0.0), 2, 2, 0.01, 100.0, 10_000).build();
//! let fleet = FleetBuilder::new()
//!     .vehicle("taxi-0", NodeId(0), SimTime(0), SimTime(3_600))
//!     .vehicle("taxi-1", NodeId(3), SimTime(0), SimTime(3_600))
//!     .build(&net)
//!     .unwrap();
//!
//! assert_eq!(fleet.len(), 2);
//! ```

use dvrp_core::{NodeId, SimTime, VehicleId};
use dvrp_spatial::RoadNetwork;

use crate::error::{FleetError, FleetResult};
use crate::vehicle::{Fleet, Vehicle};

/// One vehicle's static description, as read from CSV or written in code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleSpec {
    pub name:       String,
    pub start_node: NodeId,
    pub t0:         SimTime,
    pub t1:         SimTime,
}

#[derive(Default)]
pub struct FleetBuilder {
    specs: Vec<VehicleSpec>,
}

impl FleetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vehicle(mut self, name: impl Into<String>, start_node: NodeId, t0: SimTime, t1: SimTime) -> Self {
        self.specs.push(VehicleSpec { name: name.into(), start_node, t0, t1 });
        self
    }

    pub fn vehicles(mut self, specs: impl IntoIterator<Item = VehicleSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Assign ids in insertion order and check every vehicle against
    /// `network`.
    pub fn build(self, network: &RoadNetwork) -> FleetResult<Fleet> {
        let mut vehicles = Vec::with_capacity(self.specs.len());
        for (i, spec) in self.specs.into_iter().enumerate() {
            if !network.contains(spec.start_node) {
                return Err(FleetError::NodeNotFound(spec.start_node));
            }
            if spec.t1 < spec.t0 {
                return Err(FleetError::InvalidShift { name: spec.name, t0: spec.t0, t1: spec.t1 });
            }
            vehicles.push(Vehicle::new(VehicleId(i as u32), spec.name, spec.start_node, spec.t0, spec.t1));
        }
        Ok(Fleet::from_vehicles(vehicles))
    }
}
