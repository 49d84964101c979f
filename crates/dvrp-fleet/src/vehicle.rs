//! Vehicles and the fleet that owns them.

use dvrp_core::{NodeId, SimTime, VehicleId};
use dvrp_schedule::Schedule;

use crate::error::{FleetError, FleetResult};

pub struct Vehicle {
    pub id:         VehicleId,
    pub name:       String,
    pub start_node: NodeId,
    /// Shift start.
    pub t0:         SimTime,
    /// Latest allowable end of the shift.
    pub t1:         SimTime,
    schedule:       Schedule,
}

impl Vehicle {
    /// Passengers a vehicle can carry at once.  Fixed for this dispatcher.
    pub const CAPACITY: u32 = 1;

    pub fn new(id: VehicleId, name: impl Into<String>, start_node: NodeId, t0: SimTime, t1: SimTime) -> Self {
        Self {
            id,
            name: name.into(),
            start_node,
            t0,
            t1,
            schedule: Schedule::new(id, start_node, t0, t1),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }
}

/// All vehicles of a run, indexed by `VehicleId`.
#[derive(Default)]
pub struct Fleet {
    vehicles: Vec<Vehicle>,
}

impl Fleet {
    pub(crate) fn from_vehicles(vehicles: Vec<Vehicle>) -> Self {
        Self { vehicles }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn get(&self, id: VehicleId) -> FleetResult<&Vehicle> {
        self.vehicles.get(id.index()).ok_or(FleetError::VehicleNotFound(id))
    }

    pub fn get_mut(&mut self, id: VehicleId) -> FleetResult<&mut Vehicle> {
        self.vehicles.get_mut(id.index()).ok_or(FleetError::VehicleNotFound(id))
    }

    /// Vehicles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Vehicle> {
        self.vehicles.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.vehicles.iter().map(|v| v.id)
    }

    /// Clear every schedule back to `Unplanned`.  Called at run start.
    pub fn reset_schedules(&mut self) {
        for v in &mut self.vehicles {
            v.schedule.reset();
        }
    }
}
