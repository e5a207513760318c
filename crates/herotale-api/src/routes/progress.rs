//! The signed-in player's saved progress.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use herotale_core::gateway::ProgressRecord;
use herotale_story::application::progress_recorder::ProgressRecorder;
use tracing::instrument;

use crate::error::ApiError;
use crate::routes::auth::require_principal;
use crate::state::AppState;

/// GET /
#[instrument(skip_all)]
async fn my_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProgressRecord>>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let recorder = ProgressRecorder::new(state.ledger.clone(), principal);
    Ok(Json(recorder.my_progress().await?))
}

/// Returns the router for saved progress.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(my_progress))
}
