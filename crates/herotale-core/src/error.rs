//! Backend gateway error types.

use thiserror::Error;

/// Failure talking to the remote story backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced a usable HTTP response (connection refused,
    /// timeout, non-success status).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered but rejected the operation (GraphQL `errors`, or a
    /// mutation payload with `success: false`).
    #[error("backend error: {0}")]
    Backend(String),

    /// The response could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The operation requires an authenticated principal.
    #[error("not authenticated")]
    Unauthenticated,
}
