//! The signed-in player's inventory.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use herotale_story::application::inventory::{Inventory, InventoryItem};
use tracing::instrument;

use crate::error::ApiError;
use crate::routes::auth::require_principal;
use crate::state::AppState;

/// GET /
#[instrument(skip_all)]
async fn my_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let inventory = Inventory::new(state.catalog.clone(), principal);
    Ok(Json(inventory.items().await?))
}

/// Returns the router for the inventory.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(my_inventory))
}
