//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use herotale_graphql::GraphqlConfig;
use herotale_graphql::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use herotale_story::application::session::SessionConfig;

use crate::error::AppError;

/// How long an untouched play is kept by default.
pub const DEFAULT_PLAY_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: GraphqlConfig,
    pub session: SessionConfig,
    /// Plays untouched for this long are dropped. `None` keeps them forever.
    pub play_idle_timeout: Option<Duration>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Unset keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let base_url =
            lookup("HEROTALE_BACKEND_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = match lookup("HEROTALE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|e| {
                AppError::Config(format!("HEROTALE_REQUEST_TIMEOUT_SECS must be seconds: {e}"))
            })?),
            None => DEFAULT_TIMEOUT,
        };
        let auto_begin = match lookup("HEROTALE_AUTO_BEGIN") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                AppError::Config(format!("HEROTALE_AUTO_BEGIN must be a boolean, got {raw:?}"))
            })?,
            None => false,
        };
        let play_idle_timeout = match lookup("HEROTALE_PLAY_IDLE_SECS") {
            Some(raw) => match raw.parse::<u64>().map_err(|e| {
                AppError::Config(format!("HEROTALE_PLAY_IDLE_SECS must be seconds: {e}"))
            })? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => Some(DEFAULT_PLAY_IDLE_TIMEOUT),
        };
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };

        Ok(Self {
            backend: GraphqlConfig::new(base_url).with_timeout(timeout),
            session: SessionConfig { auto_begin },
            play_idle_timeout,
            host,
            port,
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
