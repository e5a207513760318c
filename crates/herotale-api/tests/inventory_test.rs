//! Integration tests for the inventory.

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn test_signed_in_player_sees_owned_items() {
    // Arrange
    let backend = common::test_backend();

    // Act
    let (status, items) = common::get_json(
        common::build_test_app(&backend.state),
        "/api/v1/inventory",
        Some(common::TOKEN),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "lamp");
    assert_eq!(items[0]["name"], "Brass lamp");
    assert_eq!(items[0]["description"], "Lights the way");
    assert_eq!(items[0]["icon_url"], "/media/assets/lamp.png");
}

#[tokio::test]
async fn test_inventory_requires_authentication() {
    let backend = common::test_backend();

    let (status, json) = common::get_json(
        common::build_test_app(&backend.state),
        "/api/v1/inventory",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthenticated");
}
