//! Identity abstractions.
//!
//! The engine never reads ambient auth state. Whoever owns the login flow
//! hands a [`Principal`] to the parts that need one, and anonymous play is
//! simply the absence of a principal.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::ids::UserId;

/// Bearer credential issued by the backend on login.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw token, for building request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

/// A user account as known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Role name (e.g. `player`, `author`).
    pub role: String,
    /// Optional first name.
    pub first_name: Option<String>,
    /// Optional last name.
    pub last_name: Option<String>,
}

/// An authenticated user together with the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The authenticated user.
    pub user: User,
    /// Token sent with every authenticated request.
    pub token: AuthToken,
}

/// Input for account registration.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    /// Login email.
    pub email: String,
    /// Plain-text password, forwarded once to the backend.
    pub password: String,
    /// Requested role; the backend applies its default when absent.
    #[serde(default)]
    pub role: Option<String>,
    /// Optional first name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Optional last name.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Port for account operations on the backend.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Exchanges credentials for a token.
    async fn login(&self, email: &str, password: &str) -> Result<AuthToken, GatewayError>;

    /// Resolves the user a token belongs to. `Ok(None)` means the token is
    /// no longer accepted.
    async fn current_user(&self, token: &AuthToken) -> Result<Option<User>, GatewayError>;

    /// Creates a new account.
    async fn register(&self, account: &NewAccount) -> Result<User, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_token_debug_does_not_leak_secret() {
        let token = AuthToken::new("eyJhbGciOi.secret.sig");
        assert_eq!(format!("{token:?}"), "AuthToken(..)");
        assert_eq!(token.expose(), "eyJhbGciOi.secret.sig");
    }
}
