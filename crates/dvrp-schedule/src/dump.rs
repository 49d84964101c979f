//! Plain-data snapshot of a schedule, attached to fatal errors.

use std::fmt;

use dvrp_core::{NodeId, RequestId, SimTime, VehicleId};

use crate::schedule::ScheduleStatus;
use crate::task::{Task, TaskStatus};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskDump {
    pub index:   usize,
    pub label:   String,
    pub begin:   SimTime,
    pub end:     SimTime,
    pub from:    NodeId,
    pub to:      NodeId,
    pub request: Option<RequestId>,
    pub status:  TaskStatus,
}

impl TaskDump {
    pub fn new(index: usize, task: &Task) -> Self {
        Self {
            index,
            label:   task.label().to_owned(),
            begin:   task.begin,
            end:     task.end,
            from:    task.begin_node(),
            to:      task.end_node(),
            request: task.request(),
            status:  task.status(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleDump {
    pub vehicle: VehicleId,
    pub status:  ScheduleStatus,
    pub current: Option<usize>,
    pub t0:      SimTime,
    pub t1:      SimTime,
    pub tasks:   Vec<TaskDump>,
}

impl fmt::Display for ScheduleDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {:?} shift [{}, {}) {} tasks",
            self.vehicle,
            self.status,
            self.t0,
            self.t1,
            self.tasks.len(),
        )?;
        for t in &self.tasks {
            let marker = if Some(t.index) == self.current { '*' } else { ' ' };
            write!(
                f,
                "{marker}{:>3} {:<16} [{}, {}) {}→{} {:?}",
                t.index, t.label, t.begin, t.end, t.from, t.to, t.status,
            )?;
            if let Some(r) = t.request {
                write!(f, " {r}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
