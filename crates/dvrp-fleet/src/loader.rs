//! CSV loaders for vehicles and requests.
//!
//! # Vehicles
//!
//! ```csv
//! name,start_node,lat,lon,t0,t1
//! taxi-0,12,,,0,86400
//! taxi-1,,52.521,13.409,0,
//! ```
//!
//! # Requests
//!
//! ```csv
//! submitted,from_node,from_lat,from_lon,to_node,to_lat,to_lon,t0
//! 60,4,,,17,,,60
//! 90,,52.52,13.40,,52.53,13.41,
//! ```
//!
//! A location is either a node id or a `lat`/`lon` pair snapped to the
//! nearest node of the network.  An empty `t1` means no shift end; an empty
//! request `t0` means "as soon as submitted".  Requests are returned sorted by
//! submission time (stable, so file order breaks ties).

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use dvrp_core::{GeoPoint, NodeId, SimTime};
use dvrp_spatial::RoadNetwork;

use crate::builder::VehicleSpec;
use crate::error::{FleetError, FleetResult};
use crate::request::NewRequest;

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct VehicleRecord {
    name:       String,
    start_node: Option<u32>,
    lat:        Option<f32>,
    lon:        Option<f32>,
    t0:         u64,
    t1:         Option<u64>,
}

#[derive(Deserialize)]
struct RequestRecord {
    submitted: u64,
    from_node: Option<u32>,
    from_lat:  Option<f32>,
    from_lon:  Option<f32>,
    to_node:   Option<u32>,
    to_lat:    Option<f32>,
    to_lon:    Option<f32>,
    t0:        Option<u64>,
}

// ── Public API ────────────────────────────────────────────────────────────────

pub fn load_vehicles_csv(path: &Path, network: &RoadNetwork) -> FleetResult<Vec<VehicleSpec>> {
    let file = std::fs::File::open(path)?;
    load_vehicles_reader(file, network)
}

/// Like [`load_vehicles_csv`] but accepts any `Read` source.
pub fn load_vehicles_reader<R: Read>(reader: R, network: &RoadNetwork) -> FleetResult<Vec<VehicleSpec>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut specs = Vec::new();
    for result in csv_reader.deserialize::<VehicleRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let start_node = resolve(network, row.start_node, row.lat, row.lon, &row.name)?;
        specs.push(VehicleSpec {
            start_node,
            t0: SimTime(row.t0),
            t1: row.t1.map_or(SimTime::MAX, SimTime),
            name: row.name,
        });
    }
    Ok(specs)
}

pub fn load_requests_csv(path: &Path, network: &RoadNetwork) -> FleetResult<Vec<NewRequest>> {
    let file = std::fs::File::open(path)?;
    load_requests_reader(file, network)
}

/// Like [`load_requests_csv`] but accepts any `Read` source.
pub fn load_requests_reader<R: Read>(reader: R, network: &RoadNetwork) -> FleetResult<Vec<NewRequest>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut requests = Vec::new();
    for (line, result) in csv_reader.deserialize::<RequestRecord>().enumerate() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let what = format!("request row {}", line + 1);
        let from = resolve(network, row.from_node, row.from_lat, row.from_lon, &what)?;
        let to = resolve(network, row.to_node, row.to_lat, row.to_lon, &what)?;
        requests.push(NewRequest {
            from,
            to,
            t0: SimTime(row.t0.unwrap_or(row.submitted).max(row.submitted)),
            submitted: SimTime(row.submitted),
        });
    }
    requests.sort_by_key(|r| r.submitted);
    Ok(requests)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn resolve(
    network: &RoadNetwork,
    node: Option<u32>,
    lat: Option<f32>,
    lon: Option<f32>,
    what: &str,
) -> FleetResult<NodeId> {
    match (node, lat, lon) {
        (Some(n), _, _) => {
            let id = NodeId(n);
            if network.contains(id) { Ok(id) } else { Err(FleetError::NodeNotFound(id)) }
        }
        (None, Some(lat), Some(lon)) => network
            .snap_to_node(GeoPoint::new(lat, lon))
            .ok_or_else(|| FleetError::Parse(format!("{what}: network has no nodes to snap to"))),
        _ => Err(FleetError::Parse(format!("{what}: expected a node id or a lat/lon pair"))),
    }
}
