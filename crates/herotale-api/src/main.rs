//! Herotale play API server entry point.

use std::sync::Arc;
use std::time::Duration;

use herotale_api::config::AppConfig;
use herotale_api::error::AppError;
use herotale_api::state::AppState;
use herotale_core::clock::SystemClock;
use herotale_graphql::GraphqlGateway;
use tracing_subscriber::EnvFilter;

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Herotale play API server");

    let config = AppConfig::from_env()?;
    let addr = config.listen_addr()?;

    let gateway = Arc::new(GraphqlGateway::new(&config.backend)?);
    tracing::info!(backend = %config.backend.endpoint(), "using GraphQL backend");

    let app_state = AppState::new(
        gateway.clone(),
        gateway.clone(),
        gateway.clone(),
        gateway,
        Arc::new(SystemClock),
        config.session,
    );

    if let Some(max_idle) = config.play_idle_timeout {
        let period = max_idle.min(SWEEP_PERIOD);
        tokio::spawn(app_state.plays.clone().sweep(period, max_idle));
        tracing::info!(max_idle_secs = max_idle.as_secs(), "idle plays expire");
    }

    let app = herotale_api::app(app_state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
