//! REST endpoints for the dispatch operations.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::dispatch::DispatchService;
use crate::error::DispatchError;
use crate::store::Database;

/// Shared state for dispatch routes.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DispatchService>,
    pub db: Arc<dyn Database>,
}

/// Build the Axum router with dispatch and health routes.
pub fn dispatch_routes(service: Arc<DispatchService>, db: Arc<dyn Database>) -> Router {
    let state = AppState { service, db };

    Router::new()
        .route("/health", get(health))
        .route("/api/db/ping", get(db_ping))
        .route("/api/dispatch/clinical", post(dispatch_clinical))
        .route("/api/dispatch/material", post(dispatch_material))
        .route("/api/dispatch/all", post(dispatch_all))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mediflow"
    }))
}

/// GET /api/db/ping
///
/// Store round-trip check.
async fn db_ping(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => Json(serde_json::json!({"success": true})).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"success": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

// ── Dispatch ────────────────────────────────────────────────────────────

/// POST /api/dispatch/clinical
///
/// Match the pending clinical queue against the available fleet.
async fn dispatch_clinical(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.run_clinical().await {
        Ok(outcome) => Json(serde_json::to_value(outcome).unwrap_or_default()).into_response(),
        Err(e) => run_error("clinical", &e),
    }
}

/// POST /api/dispatch/material
///
/// Match the pending material queue against the available fleet.
async fn dispatch_material(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.run_material().await {
        Ok(outcome) => Json(serde_json::to_value(outcome).unwrap_or_default()).into_response(),
        Err(e) => run_error("material", &e),
    }
}

/// POST /api/dispatch/all
///
/// Run clinical then material with a shared used-owner set. Each side
/// reports independently; a failed side becomes `{"error": ...}` and does
/// not mask the other.
async fn dispatch_all(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.service.run_all().await;

    let clinical = match &outcome.clinical {
        Ok(result) => serde_json::to_value(result).unwrap_or_default(),
        Err(e) => {
            error!(queue = "clinical", error = %e, "Dispatch run failed");
            serde_json::json!({"error": e.to_string()})
        }
    };
    let material = match &outcome.material {
        Ok(result) => serde_json::to_value(result).unwrap_or_default(),
        Err(e) => {
            error!(queue = "material", error = %e, "Dispatch run failed");
            serde_json::json!({"error": e.to_string()})
        }
    };

    Json(serde_json::json!({
        "clinical": clinical,
        "material": material,
        "total_assigned": outcome.total_assigned(),
    }))
}

fn run_error(queue: &'static str, e: &DispatchError) -> axum::response::Response {
    error!(queue, error = %e, "Dispatch run failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
        .into_response()
}
