//! Scenario catalogue.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use herotale_core::gateway::ScenarioSummary;
use herotale_core::ids::ScenarioId;
use serde::Deserialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only list published scenarios. Defaults to true.
    #[serde(default = "published_only_default")]
    pub published_only: bool,
}

fn published_only_default() -> bool {
    true
}

/// GET /
#[instrument(skip_all, fields(published_only = query.published_only))]
async fn list_scenarios(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ScenarioSummary>>, ApiError> {
    let scenarios = state.accessor.list_scenarios(query.published_only).await?;
    Ok(Json(scenarios))
}

/// GET /{id}
#[instrument(skip_all, fields(scenario_id = %id))]
async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<ScenarioId>,
) -> Result<Json<ScenarioSummary>, ApiError> {
    state
        .accessor
        .scenario(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::ScenarioNotFound(id))
}

/// Returns the router for the scenario catalogue.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_scenarios))
        .route("/{id}", get(get_scenario))
}
