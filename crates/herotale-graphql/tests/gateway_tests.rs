//! Integration tests for `GraphqlGateway` against an in-process fake backend.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use herotale_core::error::GatewayError;
use herotale_core::gateway::{AssetCatalog, ProgressLedger, ScenarioGraphSource, TransitionEntry};
use herotale_core::identity::{AuthToken, IdentityGateway, Principal, User};
use herotale_core::ids::{ChoiceId, ProgressId, ScenarioId, SceneId};
use herotale_graphql::{GraphqlConfig, GraphqlGateway};
use serde_json::{Value, json};

/// One request as the fake backend saw it.
#[derive(Debug, Clone)]
struct Seen {
    operation: String,
    variables: Value,
    authorization: Option<String>,
}

type Responder = dyn Fn(&str, &Value) -> Response + Send + Sync;

#[derive(Clone)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
    respond: Arc<Responder>,
}

async fn graphql(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let operation = body["operationName"].as_str().unwrap_or_default().to_owned();
    let variables = body["variables"].clone();
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    backend.seen.lock().unwrap().push(Seen {
        operation: operation.clone(),
        variables: variables.clone(),
        authorization,
    });
    (backend.respond)(&operation, &variables)
}

/// Starts a fake backend and returns a gateway pointed at it, plus the log of
/// requests it received.
async fn backend<F>(respond: F) -> (GraphqlGateway, Arc<Mutex<Vec<Seen>>>)
where
    F: Fn(&str, &Value) -> Response + Send + Sync + 'static,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = Backend {
        seen: seen.clone(),
        respond: Arc::new(respond),
    };
    let app = Router::new()
        .route("/graphql/", post(graphql))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let gateway = GraphqlGateway::new(&GraphqlConfig::new(format!("http://{addr}"))).unwrap();
    (gateway, seen)
}

fn data(value: Value) -> Response {
    Json(json!({ "data": value })).into_response()
}

fn principal() -> Principal {
    Principal {
        user: User {
            id: "u-1".into(),
            email: "hero@example.org".to_owned(),
            role: "player".to_owned(),
            first_name: None,
            last_name: None,
        },
        token: AuthToken::new("jwt-abc"),
    }
}

// --- scenario graph ---

#[tokio::test]
async fn test_scenes_by_scenario_decodes_scenes_and_media() {
    // Arrange
    let (gateway, seen) = backend(|_, _| {
        data(json!({
            "scenesByScenario": [
                {
                    "mongoId": "A", "title": "Gate", "text": "A gate.", "order": 0,
                    "isStartScene": true, "isEndScene": false,
                    "imageId": { "mongoId": "img-1", "url": "/media/assets/gate.png" },
                    "soundId": null, "musicId": null
                },
                {
                    "mongoId": "C", "title": "End", "text": "Fin.", "order": null,
                    "isStartScene": false, "isEndScene": true,
                    "imageId": null, "soundId": null, "musicId": null
                }
            ]
        }))
    })
    .await;

    // Act
    let scenes = gateway
        .scenes_by_scenario(&ScenarioId::from("S1"))
        .await
        .unwrap();

    // Assert
    assert_eq!(scenes.len(), 2);
    assert!(scenes[0].is_start_scene);
    assert_eq!(
        scenes[0].image.as_ref().unwrap().url,
        "/media/assets/gate.png"
    );
    assert!(scenes[1].is_end_scene);
    assert_eq!(scenes[1].order, None);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].operation, "GetScenesByScenario");
    assert_eq!(seen[0].variables, json!({ "scenarioId": "S1" }));
    assert_eq!(seen[0].authorization, None);
}

#[tokio::test]
async fn test_choices_by_scene_reads_destination_references() {
    let (gateway, _) = backend(|_, _| {
        data(json!({
            "choicesByScene": [
                { "mongoId": "north", "text": "go north", "order": 1, "toSceneId": { "mongoId": "B" } },
                { "mongoId": "south", "text": "go south", "order": 0, "toSceneId": { "mongoId": "C" } }
            ]
        }))
    })
    .await;

    let choices = gateway.choices_by_scene(&SceneId::from("A")).await.unwrap();

    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0].id, ChoiceId::from("north"));
    assert_eq!(choices[0].to_scene_id, SceneId::from("B"));
    assert_eq!(choices[1].order, 0);
}

#[tokio::test]
async fn test_unknown_scenario_is_none() {
    let (gateway, _) = backend(|_, _| data(json!({ "scenarioById": null }))).await;

    let scenario = gateway
        .scenario_by_id(&ScenarioId::from("missing"))
        .await
        .unwrap();

    assert!(scenario.is_none());
}

#[tokio::test]
async fn test_list_scenarios_passes_published_filter() {
    let (gateway, seen) = backend(|_, _| {
        data(json!({
            "allScenarios": [
                { "mongoId": "S1", "title": "The Gate", "description": "d", "isPublished": true,
                  "createdAt": "2026-01-01T00:00:00" }
            ]
        }))
    })
    .await;

    let scenarios = gateway.list_scenarios(true).await.unwrap();

    assert_eq!(scenarios[0].title, "The Gate");
    assert!(scenarios[0].created_at.is_some());
    assert_eq!(
        seen.lock().unwrap()[0].variables,
        json!({ "publishedOnly": true })
    );
}

// --- progress ---

#[tokio::test]
async fn test_progress_for_sends_jwt_and_user_id() {
    // Arrange
    let (gateway, seen) = backend(|_, _| {
        data(json!({
            "progressByUserAndScenario": {
                "mongoId": "p-7",
                "scenarioId": { "mongoId": "S1" },
                "currentSceneId": { "mongoId": "B" },
                "isCompleted": false,
                "progressPercentage": 50.0,
                "totalTimeSpent": 120,
                "history": [
                    { "sceneId": { "mongoId": "B" }, "choiceId": { "mongoId": "north" },
                      "timestamp": "2026-01-15T10:00:00+00:00" }
                ]
            }
        }))
    })
    .await;

    // Act
    let record = gateway
        .progress_for(&principal(), &ScenarioId::from("S1"))
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(record.id, ProgressId::from("p-7"));
    assert_eq!(record.current_scene_id, Some(SceneId::from("B")));
    assert_eq!(record.history.len(), 1);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].authorization.as_deref(), Some("JWT jwt-abc"));
    assert_eq!(
        seen[0].variables,
        json!({ "userId": "u-1", "scenarioId": "S1" })
    );
}

#[tokio::test]
async fn test_create_progress_refused_by_backend_is_backend_error() {
    let (gateway, _) = backend(|_, _| {
        data(json!({
            "createProgress": { "progress": null, "success": false, "message": "Scenario not found" }
        }))
    })
    .await;

    let err = gateway
        .create_progress(&principal(), &"S1".into(), &"A".into())
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::Backend("Scenario not found".to_owned()));
}

#[tokio::test]
async fn test_record_transition_sends_entry_with_metadata() {
    // Arrange
    let (gateway, seen) = backend(|_, _| {
        data(json!({ "recordProgress": { "success": true, "message": "Progress recorded" } }))
    })
    .await;
    let entry = TransitionEntry {
        progress_id: "p-1".into(),
        scene_id: "C".into(),
        choice_id: Some("south".into()),
        metadata: json!({ "fromSceneId": "A", "step": 1 }),
    };

    // Act
    let ack = gateway
        .record_transition(&principal(), &entry)
        .await
        .unwrap();

    // Assert
    assert!(ack.success);
    assert_eq!(
        seen.lock().unwrap()[0].variables,
        json!({
            "input": {
                "progressId": "p-1",
                "sceneId": "C",
                "choiceId": "south",
                "metadata": { "fromSceneId": "A", "step": 1 }
            }
        })
    );
}

#[tokio::test]
async fn test_update_current_scene_targets_progress() {
    let (gateway, seen) = backend(|_, _| {
        data(json!({ "updateProgress": { "success": true, "message": null } }))
    })
    .await;

    gateway
        .update_current_scene(&principal(), &"p-1".into(), &"A".into())
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].operation, "UpdateProgress");
    assert_eq!(
        seen[0].variables,
        json!({ "progressId": "p-1", "input": { "currentSceneId": "A" } })
    );
}

// --- inventory ---

#[tokio::test]
async fn test_my_assets_sends_jwt_and_decodes_items() {
    // Arrange
    let (gateway, seen) = backend(|_, _| {
        data(json!({
            "myAssets": [
                { "mongoId": "lamp", "name": "Brass lamp", "type": "item",
                  "url": "/media/assets/lamp.png",
                  "metadata": "{\"description\": \"Lights the way\"}" },
                { "mongoId": "key", "name": "Iron key", "type": "item",
                  "url": null, "metadata": null }
            ]
        }))
    })
    .await;

    // Act
    let assets = gateway.my_assets(&principal()).await.unwrap();

    // Assert
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].name, "Brass lamp");
    assert_eq!(assets[0].metadata["description"], "Lights the way");
    assert_eq!(assets[1].url, None);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].operation, "GetMyAssets");
    assert_eq!(seen[0].authorization.as_deref(), Some("JWT jwt-abc"));
}

#[tokio::test]
async fn test_my_assets_null_list_is_empty() {
    let (gateway, _) = backend(|_, _| data(json!({ "myAssets": null }))).await;

    let assets = gateway.my_assets(&principal()).await.unwrap();

    assert!(assets.is_empty());
}

// --- identity ---

#[tokio::test]
async fn test_login_failure_carries_backend_message() {
    let (gateway, _) = backend(|_, _| {
        data(json!({
            "login": { "token": null, "success": false, "message": "Invalid credentials" }
        }))
    })
    .await;

    let err = gateway
        .login("hero@example.org", "nope")
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::Backend("Invalid credentials".to_owned()));
}

#[tokio::test]
async fn test_refused_token_has_no_current_user() {
    let (gateway, _) = backend(|_, _| {
        Json(json!({
            "errors": [{ "message": "Signature has expired" }],
            "data": { "me": null }
        }))
        .into_response()
    })
    .await;

    let user = gateway
        .current_user(&AuthToken::new("old"))
        .await
        .unwrap();

    assert!(user.is_none());
}

#[tokio::test]
async fn test_register_returns_created_user() {
    let (gateway, seen) = backend(|_, _| {
        data(json!({
            "createUser": {
                "user": { "mongoId": "u-9", "email": "new@example.org", "role": "player",
                          "firstName": "Ada", "lastName": null },
                "success": true,
                "message": "User created"
            }
        }))
    })
    .await;
    let account = herotale_core::identity::NewAccount {
        email: "new@example.org".to_owned(),
        password: "pw".to_owned(),
        role: None,
        first_name: Some("Ada".to_owned()),
        last_name: None,
    };

    let user = gateway.register(&account).await.unwrap();

    assert_eq!(user.id.as_str(), "u-9");
    assert_eq!(
        seen.lock().unwrap()[0].variables["input"]["role"],
        "player"
    );
}

// --- transport ---

#[tokio::test]
async fn test_server_error_without_graphql_body_is_transport() {
    let (gateway, _) =
        backend(|_, _| (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()).await;

    let err = gateway.list_scenarios(false).await.unwrap_err();

    assert!(matches!(err, GatewayError::Transport(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let gateway = GraphqlGateway::new(&GraphqlConfig::new(format!("http://{addr}"))).unwrap();

    let err = gateway.list_scenarios(false).await.unwrap_err();

    assert!(matches!(err, GatewayError::Transport(_)));
}

#[tokio::test]
async fn test_malformed_data_is_decode_error() {
    let (gateway, _) = backend(|_, _| data(json!({ "allScenarios": [{ "title": 5 }] }))).await;

    let err = gateway.list_scenarios(false).await.unwrap_err();

    assert!(matches!(err, GatewayError::Decode(_)));
}
