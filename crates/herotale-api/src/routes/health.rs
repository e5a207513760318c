//! Liveness probe.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Plays currently held in memory.
    pub active_plays: usize,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        active_plays: state.plays.count().await,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
