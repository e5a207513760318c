//! Request extractors.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// A JSON request body. Unlike `axum::Json`, a body that cannot be read is
/// answered with the API's `{error, message}` shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
