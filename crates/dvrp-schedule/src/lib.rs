//! `dvrp-schedule`: per-vehicle task schedules and the wake queue.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`task`]       | `Task`, `TaskKind`, `DrivePurpose`, `StayPurpose`, `TaskStatus` |
//! | [`schedule`]   | `Schedule`, `ScheduleStatus`, `DiversionPoint`             |
//! | [`policy`]     | `DiversionPolicy`                                          |
//! | [`wake_queue`] | `WakeQueue` (`BTreeMap<SimTime, Vec<VehicleId>>`)          |
//! | [`dump`]       | `ScheduleDump`, `TaskDump`                                 |
//! | [`error`]      | `ScheduleError`, `ScheduleResult<T>`                       |
//!
//! # Lifecycle (summary)
//!
//! ```text
//! Unplanned ──append──▶ Planned ──start_next_task──▶ Started
//!     ▲                                                 │
//!     └──── replace_tail(0, []) (nothing started)       ▼
//!                                last task performed at or after t1
//!                                                       ▼
//!                                                   Completed
//! ```

pub mod dump;
pub mod error;
pub mod policy;
pub mod schedule;
pub mod task;
pub mod wake_queue;

#[cfg(test)]
mod tests;

pub use dump::{ScheduleDump, TaskDump};
pub use error::{ScheduleError, ScheduleResult};
pub use policy::DiversionPolicy;
pub use schedule::{DiversionPoint, Schedule, ScheduleStatus};
pub use task::{DrivePurpose, StayPurpose, Task, TaskKind, TaskStatus};
pub use wake_queue::WakeQueue;
