//! HTTP transport for GraphQL operations.

use herotale_core::error::GatewayError;
use herotale_core::identity::AuthToken;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::config::GraphqlConfig;

/// Backend messages that mean the caller's token was missing or refused.
const AUTH_FAILURE_MARKERS: [&str; 4] = [
    "permission",
    "signature has expired",
    "error decoding signature",
    "not authenticated",
];

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Sends GraphQL operations to one endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GraphqlClient {
    /// Builds a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the HTTP client cannot be
    /// initialised.
    pub fn new(config: &GraphqlConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint(),
        })
    }

    /// The endpoint operations are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Executes one operation and decodes its `data` member into `T`.
    ///
    /// # Errors
    ///
    /// - `Transport` when the request cannot be completed or the backend
    ///   answers with a non-GraphQL failure.
    /// - `Unauthenticated` when the backend refuses the token.
    /// - `Backend` when the response carries GraphQL errors.
    /// - `Decode` when `data` does not have the expected shape.
    #[instrument(skip_all, fields(operation = operation))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &'static str,
        variables: Value,
        token: Option<&AuthToken>,
    ) -> Result<T, GatewayError> {
        let body = json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });
        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("JWT {}", token.expose()));
        }
        debug!(authenticated = token.is_some(), "sending graphql operation");

        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Unauthenticated);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let envelope: Envelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(GatewayError::Transport(format!(
                    "backend answered HTTP {status}"
                )));
            }
            Err(err) => return Err(GatewayError::Decode(err.to_string())),
        };

        if !envelope.errors.is_empty() {
            return Err(classify(&envelope.errors));
        }
        match envelope.data {
            Some(data) => {
                serde_json::from_value(data).map_err(|err| GatewayError::Decode(err.to_string()))
            }
            None if !status.is_success() => Err(GatewayError::Transport(format!(
                "backend answered HTTP {status}"
            ))),
            None => Err(GatewayError::Decode("response carried no data".to_owned())),
        }
    }
}

fn classify(errors: &[ErrorMessage]) -> GatewayError {
    let refused = errors.iter().any(|error| {
        let message = error.message.to_lowercase();
        AUTH_FAILURE_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    });
    if refused {
        return GatewayError::Unauthenticated;
    }
    let joined = errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    warn!(errors = %joined, "backend reported errors");
    GatewayError::Backend(joined)
}
