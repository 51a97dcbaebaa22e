//! HTTP surface — axum routes around the dispatch service.

pub mod routes;

pub use routes::dispatch_routes;
