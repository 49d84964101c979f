//! Fluent builder for constructing a [`Sim`].

use dvrp_core::{NodeId, SimConfig, SimTime};
use dvrp_dispatch::{DispatchConfig, Dispatcher, Objective};
use dvrp_fleet::{FleetBuilder, NewRequest, VehicleSpec};
use dvrp_schedule::WakeQueue;
use dvrp_spatial::{PathCostOracle, RoadNetwork, Router};

use crate::{DemandFeed, Sim, SimError, SimResult};

/// Fluent builder for [`Sim<R>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: start time, tick length, total ticks, seed
/// - [`RoadNetwork`] and a `R: Router` (e.g. [`dvrp_spatial::DijkstraRouter`])
///
/// # Optional inputs (have defaults)
///
/// | Method             | Default                         |
/// |--------------------|---------------------------------|
/// | `.dispatch(c)`     | `DispatchConfig::default()`     |
/// | `.vehicle(..)`     | no vehicles (build fails)       |
/// | `.requests(v)`     | no demand                       |
/// | `.objective(o)`    | the one `DispatchConfig` names  |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, network, DijkstraRouter::new())
///     .dispatch(dispatch_config)
///     .vehicles(load_vehicles_csv(path, &network)?)
///     .requests(demand)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<R: Router> {
    config:    SimConfig,
    dispatch:  DispatchConfig,
    network:   RoadNetwork,
    router:    R,
    vehicles:  Vec<VehicleSpec>,
    requests:  Vec<NewRequest>,
    objective: Option<Box<dyn Objective>>,
}

impl<R: Router> SimBuilder<R> {
    pub fn new(config: SimConfig, network: RoadNetwork, router: R) -> Self {
        Self {
            config,
            dispatch:  DispatchConfig::default(),
            network,
            router,
            vehicles:  Vec::new(),
            requests:  Vec::new(),
            objective: None,
        }
    }

    pub fn dispatch(mut self, config: DispatchConfig) -> Self {
        self.dispatch = config;
        self
    }

    pub fn vehicle(mut self, name: impl Into<String>, start_node: NodeId, t0: SimTime, t1: SimTime) -> Self {
        self.vehicles.push(VehicleSpec { name: name.into(), start_node, t0, t1 });
        self
    }

    pub fn vehicles(mut self, specs: impl IntoIterator<Item = VehicleSpec>) -> Self {
        self.vehicles.extend(specs);
        self
    }

    /// Requests are fed to the optimizer at their submission times.
    pub fn requests(mut self, requests: impl IntoIterator<Item = NewRequest>) -> Self {
        self.requests.extend(requests);
        self
    }

    /// Override the objective chosen by the dispatch config.
    pub fn objective(mut self, objective: Box<dyn Objective>) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Validate every input and assemble the simulation.
    ///
    /// # Errors
    ///
    /// - [`SimError::Core`] if the run config is invalid.
    /// - [`SimError::Config`] if no vehicles were supplied.
    /// - [`SimError::Fleet`] if a vehicle starts on an unknown node or has
    ///   an inverted shift.
    /// - [`SimError::Dispatch`] if the dispatch config is invalid.
    pub fn build(self) -> SimResult<Sim<R>> {
        self.config.validate()?;
        if self.vehicles.is_empty() {
            return Err(SimError::Config("fleet is empty".into()));
        }

        let fleet = FleetBuilder::new().vehicles(self.vehicles).build(&self.network)?;
        let oracle = PathCostOracle::new(self.network, self.router);
        let mut dispatcher = Dispatcher::new(self.dispatch, oracle, fleet)?;
        if let Some(objective) = self.objective {
            dispatcher = dispatcher.with_objective(objective);
        }

        Ok(Sim {
            clock: self.config.make_clock(),
            config: self.config,
            dispatcher,
            demand: DemandFeed::new(self.requests.clone()),
            requests: self.requests,
            wake_queue: WakeQueue::new(),
            cycles: 0,
            diversions: 0,
            dropped: 0,
        })
    }
}
