//! Plays: one player's session in one scenario.
//!
//! Every response carries the session's current read model. Fetches started by
//! an action run in the background; results that have already arrived are
//! applied before each request is served, and `?wait=true` waits until nothing
//! is in flight.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use herotale_core::ids::{ChoiceId, ScenarioId};
use herotale_story::application::session::StorySession;
use herotale_story::domain::commands::{
    BeginStory, MakeChoice, RestartStory, RetryChoices, SelectScenario,
};
use herotale_story::domain::progression::StoryView;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::routes::auth::auth_context;
use crate::state::{AppState, PlayHandle};

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreatePlayRequest {
    pub scenario_id: ScenarioId,
}

/// Request body for POST /{id}/choose.
#[derive(Debug, Deserialize)]
pub struct ChooseRequest {
    pub choice_id: ChoiceId,
}

/// Query string accepted by every play route.
#[derive(Debug, Default, Deserialize)]
pub struct WaitQuery {
    /// Wait for in-flight fetches before answering.
    #[serde(default)]
    pub wait: bool,
}

/// A play and its read model.
#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub play_id: Uuid,
    #[serde(flatten)]
    pub view: StoryView,
}

async fn find(state: &AppState, id: Uuid) -> Result<PlayHandle, ApiError> {
    state.plays.get(id).await.ok_or(ApiError::PlayNotFound(id))
}

async fn respond(play_id: Uuid, session: &mut StorySession, wait: bool) -> Json<PlayResponse> {
    let view = if wait {
        session.settle().await
    } else {
        session.poll();
        session.view()
    };
    Json(PlayResponse { play_id, view })
}

/// POST /
#[instrument(skip_all, fields(scenario_id = %request.scenario_id))]
async fn create_play(
    State(state): State<AppState>,
    Query(query): Query<WaitQuery>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreatePlayRequest>,
) -> Result<(StatusCode, Json<PlayResponse>), ApiError> {
    let context = auth_context(&state, &headers).await?;
    let mut session = StorySession::for_context(
        state.accessor.clone(),
        state.ledger.clone(),
        &context,
        state.clock.clone(),
        state.session_config,
    );
    session.select_scenario(&SelectScenario {
        correlation_id: Uuid::new_v4(),
        scenario_id: request.scenario_id,
    });

    let (play_id, handle) = state.plays.insert(session).await;
    info!(%play_id, authenticated = context.principal().is_some(), "play created");

    let mut session = handle.lock().await;
    let body = respond(play_id, &mut session, query.wait).await;
    Ok((StatusCode::CREATED, body))
}

/// GET /{id}
#[instrument(skip_all, fields(%play_id))]
async fn get_play(
    State(state): State<AppState>,
    Path(play_id): Path<Uuid>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<PlayResponse>, ApiError> {
    let handle = find(&state, play_id).await?;
    let mut session = handle.lock().await;
    Ok(respond(play_id, &mut session, query.wait).await)
}

/// POST /{id}/begin
#[instrument(skip_all, fields(%play_id))]
async fn begin(
    State(state): State<AppState>,
    Path(play_id): Path<Uuid>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<PlayResponse>, ApiError> {
    let handle = find(&state, play_id).await?;
    let mut session = handle.lock().await;
    session.poll();
    session.begin(&BeginStory {
        correlation_id: Uuid::new_v4(),
    })?;
    Ok(respond(play_id, &mut session, query.wait).await)
}

/// POST /{id}/choose
#[instrument(skip_all, fields(%play_id, choice_id = %request.choice_id))]
async fn choose(
    State(state): State<AppState>,
    Path(play_id): Path<Uuid>,
    Query(query): Query<WaitQuery>,
    ApiJson(request): ApiJson<ChooseRequest>,
) -> Result<Json<PlayResponse>, ApiError> {
    let handle = find(&state, play_id).await?;
    let mut session = handle.lock().await;
    session.poll();
    session.choose(&MakeChoice {
        correlation_id: Uuid::new_v4(),
        choice_id: request.choice_id,
    })?;
    Ok(respond(play_id, &mut session, query.wait).await)
}

/// POST /{id}/restart
#[instrument(skip_all, fields(%play_id))]
async fn restart(
    State(state): State<AppState>,
    Path(play_id): Path<Uuid>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<PlayResponse>, ApiError> {
    let handle = find(&state, play_id).await?;
    let mut session = handle.lock().await;
    session.poll();
    session.restart(&RestartStory {
        correlation_id: Uuid::new_v4(),
    })?;
    Ok(respond(play_id, &mut session, query.wait).await)
}

/// POST /{id}/retry-choices
#[instrument(skip_all, fields(%play_id))]
async fn retry_choices(
    State(state): State<AppState>,
    Path(play_id): Path<Uuid>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<PlayResponse>, ApiError> {
    let handle = find(&state, play_id).await?;
    let mut session = handle.lock().await;
    session.poll();
    session.retry_choices(&RetryChoices {
        correlation_id: Uuid::new_v4(),
    })?;
    Ok(respond(play_id, &mut session, query.wait).await)
}

/// DELETE /{id}
#[instrument(skip_all, fields(%play_id))]
async fn delete_play(
    State(state): State<AppState>,
    Path(play_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.plays.remove(play_id).await {
        info!("play ended");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::PlayNotFound(play_id))
    }
}

/// Returns the router for plays.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_play))
        .route("/{id}", get(get_play).delete(delete_play))
        .route("/{id}/begin", post(begin))
        .route("/{id}/choose", post(choose))
        .route("/{id}/restart", post(restart))
        .route("/{id}/retry-choices", post(retry_choices))
}
