//! Backend connection settings.

use std::time::Duration;

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Per-request timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the GraphQL backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphqlConfig {
    /// Scheme, host and port, without the `/graphql/` path.
    pub base_url: String,
    pub timeout: Duration,
}

impl GraphqlConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The GraphQL endpoint, always with a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/graphql/", self.base_url.trim_end_matches('/'))
    }
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
