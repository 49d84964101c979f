//! `dvrp-sim`: fixed-step reference adapter around the dispatch core.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Demand     requests with submitted ≤ now → Dispatcher::on_request_submitted
//!                refused ones → SimObserver::on_request_dropped
//!   ② Wake       drain vehicles due in WakeQueue; for each:
//!                   current.end ≤ now   → on_task_completed(end)
//!                   next.begin  ≤ now   → on_task_started(begin)
//!                   trailing wait began → on_vehicle_idle
//!                 then push the next task boundary back into the queue.
//!   ③ Optimize   Dispatcher::on_tick(now) (trigger-gated cycle)
//!   ④ Touched    re-advance vehicles whose schedules the cycle changed
//!   ⑤ Publish    drain DispatchEvents to the SimObserver
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Cycle prefetches run on Rayon's thread pool.           |
//! | `serde`    | Derives `Serialize`/`Deserialize` on `SimSummary`.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use dvrp_core::SimConfig;
//! use dvrp_sim::{NoopObserver, SimBuilder};
//! use dvrp_spatial::DijkstraRouter;
//!
//! let mut sim = SimBuilder::new(SimConfig::default(), network, DijkstraRouter::new())
//!     .vehicle("taxi-0", depot, SimTime::ZERO, SimTime(86_400))
//!     .requests(demand)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! println!("{:?}", sim.summary());
//! ```

pub mod builder;
pub mod demand;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use demand::{random_requests, DemandFeed};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{Sim, SimSummary};
