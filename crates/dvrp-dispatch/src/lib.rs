//! `dvrp-dispatch`: the online dispatch optimizer.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                     |
//! |----------------|--------------------------------------------------------------|
//! | [`config`]     | `DispatchConfig`, `ObjectiveKind`, `OptimizationTrigger`     |
//! | [`filter`]     | `CandidateFilter<T>`: per-cycle nearest-K over vehicles or requests |
//! | [`objective`]  | `Objective` trait, `MinWaitTime`, `MinTotalDistance`         |
//! | [`scheduler`]  | `Scheduler`: eligibility, departures, trip chains, diversion, cancellation |
//! | [`dispatcher`] | `Dispatcher<R>`: cycle state machine and the adapter API     |
//! | [`event`]      | `DispatchEvent`                                              |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                         |
//!
//! # Data flow
//!
//! ```text
//! Dispatcher::on_tick(now)
//!   → eligible vehicles + unplanned requests
//!   → CandidateFilter (nearest-K by straight-line distance)
//!   → Scheduler::evaluate → PathCache → PathCostOracle (on miss)
//!   → Objective::score → best candidate
//!   → Scheduler::commit → Schedule
//! ```
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Cycle prefetches are routed on Rayon's pool.              |
//! | `serde`    | Derives `Serialize`/`Deserialize` on events and reports.  |

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod filter;
pub mod objective;
pub mod scheduler;


pub use config::{DispatchConfig, ObjectiveKind, OptimizationTrigger};
pub use dispatcher::{CycleMode, CyclePhase, CycleReport, Dispatcher};
pub use error::{DispatchError, DispatchResult};
pub use event::DispatchEvent;
pub use filter::CandidateFilter;
pub use objective::{objective_for, MinTotalDistance, MinWaitTime, Objective};
pub use scheduler::{Candidate, CommitOutcome, Departure, DepartureKind, Scheduler};
