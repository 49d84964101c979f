//! grid: taxi dispatch on a synthetic Manhattan grid.
//!
//! Usage: `grid [config.json]`.  Without a config file the built-in defaults
//! below are used; any field the file omits keeps its default.  Set
//! `RUST_LOG=dvrp_dispatch=debug` to follow individual cycles.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dvrp_core::{GeoPoint, NodeId, SimConfig, SimRng, SimTime};
use dvrp_dispatch::{DispatchConfig, DispatchError, DispatchEvent};
use dvrp_fleet::{load_requests_csv, load_vehicles_csv, NewRequest, VehicleSpec};
use dvrp_sim::{random_requests, SimBuilder, SimObserver, SimSummary};
use dvrp_spatial::{DijkstraRouter, RoadNetwork, RoadNetworkBuilder, RouteMetric};

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    sim:           SimConfig,
    dispatch:      DispatchConfig,
    rows:          u32,
    cols:          u32,
    /// Seconds to cross one block.
    block_secs:    u32,
    block_m:       f32,
    /// `travel_time` or `distance`.
    route_metric:  RouteMetric,
    vehicles:      usize,
    requests:      usize,
    /// Demand is spread over the first `demand_secs` of the run.
    demand_secs:   u64,
    /// Replace the synthetic fleet and demand with CSV files.
    vehicles_csv:  Option<PathBuf>,
    requests_csv:  Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig {
                tick_duration_secs: 10,
                total_ticks: 4 * 360, // 4 h
                ..SimConfig::default()
            },
            dispatch:     DispatchConfig::default(),
            rows:         10,
            cols:         10,
            block_secs:   60,
            block_m:      250.0,
            route_metric: RouteMetric::TravelTime,
            vehicles:     12,
            requests:     150,
            demand_secs:  3 * 3_600,
            vehicles_csv: None,
            requests_csv: None,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<DemoConfig> {
    let Some(path) = path else {
        return Ok(DemoConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Logs progress once per simulated hour.
#[derive(Default)]
struct HourlyLog {
    planned:   usize,
    completed: usize,
    rejected:  usize,
    idle:      usize,
    dropped:   usize,
}

impl SimObserver for HourlyLog {
    fn on_request_dropped(&mut self, _request: &NewRequest, _error: &DispatchError) {
        self.dropped += 1;
    }

    fn on_event(&mut self, event: &DispatchEvent) {
        match event {
            DispatchEvent::RequestPlanned { .. } => self.planned += 1,
            DispatchEvent::RequestCompleted { .. } => self.completed += 1,
            DispatchEvent::RequestRejected { .. } => self.rejected += 1,
            DispatchEvent::VehicleIdle { .. } => self.idle += 1,
            _ => {}
        }
    }

    fn on_tick_end(&mut self, now: SimTime, _woken: usize) {
        if now.0 > 0 && now.0 % 3_600 == 0 {
            info!(
                at = %now,
                planned = self.planned,
                completed = self.completed,
                rejected = self.rejected,
                idle = self.idle,
                dropped = self.dropped,
                "hour",
            );
        }
    }

    fn on_sim_end(&mut self, now: SimTime, summary: &SimSummary) {
        info!(at = %now, completed = summary.completed, open = summary.open, "done");
    }
}

// ── Inputs ────────────────────────────────────────────────────────────────────

fn build_network(config: &DemoConfig) -> RoadNetwork {
    RoadNetworkBuilder::grid(
        GeoPoint::new(40.70, -74.02),
        config.rows,
        config.cols,
        0.0025,
        config.block_m,
        config.block_secs * 1_000,
    )
    .build()
}

fn fleet(config: &DemoConfig, network: &RoadNetwork, rng: &mut SimRng) -> Result<Vec<VehicleSpec>> {
    if let Some(path) = &config.vehicles_csv {
        return Ok(load_vehicles_csv(path, network)?);
    }
    let shift_end = config.sim.end_time();
    Ok((0..config.vehicles)
        .map(|i| VehicleSpec {
            name:       format!("taxi-{i}"),
            start_node: NodeId(rng.gen_range(0..network.node_count() as u32)),
            t0:         config.sim.start_time,
            t1:         shift_end,
        })
        .collect())
}

fn demand(config: &DemoConfig, network: &RoadNetwork, rng: &mut SimRng) -> Result<Vec<NewRequest>> {
    if let Some(path) = &config.requests_csv {
        return Ok(load_requests_csv(path, network)?);
    }
    let start = config.sim.start_time;
    Ok(random_requests(rng, network.node_count(), config.requests, start, start.offset(config.demand_secs)))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(path.as_deref())?;

    let network = build_network(&config);
    info!(nodes = network.node_count(), edges = network.edge_count(), "network built");

    let mut rng = SimRng::new(config.sim.seed);
    let vehicles = fleet(&config, &network, &mut rng.child(1))?;
    let requests = demand(&config, &network, &mut rng.child(2))?;
    info!(vehicles = vehicles.len(), requests = requests.len(), "inputs ready");

    let router = DijkstraRouter::new().with_metric(config.route_metric);
    let mut sim = SimBuilder::new(config.sim.clone(), network, router)
        .dispatch(config.dispatch.clone())
        .vehicles(vehicles)
        .requests(requests)
        .build()?;

    let started = Instant::now();
    sim.run(&mut HourlyLog::default())?;
    info!(wall_secs = started.elapsed().as_secs_f64(), "run complete");

    println!("{}", serde_json::to_string_pretty(&sim.summary())?);
    Ok(())
}
