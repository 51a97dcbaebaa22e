//! Task–resource dispatch engine.
//!
//! The matching core (`classify`, `rank`, `pool`, `matcher`) is pure and
//! synchronous; `service` wires it between store snapshots and the commit
//! boundary.

pub mod classify;
pub mod matcher;
pub mod model;
pub mod pool;
pub mod rank;
pub mod schedule;
pub mod service;
pub mod sweep;

pub use model::{Assignment, Capability, QueueKind, VehicleClass};
pub use service::DispatchService;
