//! Herotale play API.
//!
//! Exposes scenario browsing, authentication, story sessions ("plays"),
//! saved progress and inventories over HTTP/JSON.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the presentation layer's origins.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/scenarios", routes::scenarios::router())
        .nest("/api/v1/plays", routes::plays::router())
        .nest("/api/v1/auth", routes::auth::router())
        .nest("/api/v1/progress", routes::progress::router())
        .nest("/api/v1/inventory", routes::inventory::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
