//! Auto-dispatch sweep — periodically runs both queues in the background.
//!
//! Disabled unless `MEDIFLOW_SWEEP_INTERVAL_SECS` is set. The first tick
//! fires immediately; a failed run is logged and the loop continues.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dispatch::service::DispatchService;

/// Spawn the background sweep loop.
pub fn spawn_sweep_loop(service: Arc<DispatchService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Dispatch sweep loop started");

        let mut tick = tokio::time::interval(interval);
        loop {
            tick.tick().await;
            run_sweep(&service).await;
        }
    })
}

/// Single sweep: run both queues, log per-side outcomes.
async fn run_sweep(service: &Arc<DispatchService>) {
    let outcome = service.run_all().await;

    match &outcome.clinical {
        Ok(result) => info!(assigned = result.count, "Sweep: clinical queue dispatched"),
        Err(e) => warn!(error = %e, "Sweep: clinical dispatch failed"),
    }
    match &outcome.material {
        Ok(result) => info!(assigned = result.count, "Sweep: material queue dispatched"),
        Err(e) => warn!(error = %e, "Sweep: material dispatch failed"),
    }
}
