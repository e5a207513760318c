//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use herotale_api::state::AppState;
use herotale_core::clock::Clock;
use herotale_story::application::session::SessionConfig;
use herotale_test_support::{
    FixedClock, InMemoryAssetCatalog, InMemoryScenarioSource, RecordingProgressLedger,
    StaticIdentityGateway, fixtures,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Password of the fixture account `hero@example.org`.
pub const PASSWORD: &str = "hunter2";
/// Token the identity fake hands out for the fixture account.
pub const TOKEN: &str = "tok-1";

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// The fakes behind a test app, kept for inspection.
pub struct TestBackend {
    pub source: Arc<InMemoryScenarioSource>,
    pub ledger: Arc<RecordingProgressLedger>,
    pub state: AppState,
}

/// Builds app state over in-memory fakes serving scenario S1 and one account
/// owning a brass lamp.
pub fn test_backend() -> TestBackend {
    let source = Arc::new(InMemoryScenarioSource::new().with_scenario(fixtures::s1()));
    let ledger = Arc::new(RecordingProgressLedger::new());
    let catalog = Arc::new(InMemoryAssetCatalog::new().with_assets(
        fixtures::user().id,
        vec![fixtures::asset("lamp", "Brass lamp", "Lights the way")],
    ));
    let identity = Arc::new(StaticIdentityGateway::with_user(
        fixtures::user(),
        PASSWORD,
        TOKEN,
    ));
    let state = AppState::new(
        source.clone(),
        ledger.clone(),
        catalog,
        identity,
        fixed_clock(),
        SessionConfig::default(),
    );
    TestBackend {
        source,
        ledger,
        state,
    }
}

/// The full app router, as `main.rs` builds it.
pub fn build_test_app(state: &AppState) -> Router {
    herotale_api::app(state.clone())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let is_json = response
        .headers()
        .get("content-type")
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"));
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if is_json {
        serde_json::from_slice(&body_bytes).unwrap()
    } else {
        serde_json::Value::Null
    };
    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("JWT {token}"));
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("JWT {token}"));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}
