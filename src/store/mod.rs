//! Persistence layer — SQLite-backed storage for requests, fleet, and inventory.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, RequestState};
