//! Authentication context.
//!
//! Holds who is signed in, if anyone. The context is an ordinary value owned
//! by the shell; play sessions receive a snapshot of its principal when they
//! are created and never consult it again.

use std::sync::Arc;

use herotale_core::error::GatewayError;
use herotale_core::identity::{AuthToken, IdentityGateway, NewAccount, Principal, User};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Failure of an authentication operation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend refused the credentials or the token.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached or answered unexpectedly.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Explicit identity capability.
pub struct AuthContext {
    gateway: Arc<dyn IdentityGateway>,
    principal: Option<Principal>,
}

impl AuthContext {
    /// Creates an anonymous context.
    #[must_use]
    pub fn anonymous(gateway: Arc<dyn IdentityGateway>) -> Self {
        Self {
            gateway,
            principal: None,
        }
    }

    /// Restores a session from a previously stored token. An expired or
    /// unknown token leaves the context anonymous.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Gateway` when the backend cannot be reached; the
    /// context is left anonymous.
    #[instrument(skip_all)]
    pub async fn restore(&mut self, token: AuthToken) -> Result<Option<&User>, AuthError> {
        self.principal = None;
        match self.gateway.current_user(&token).await? {
            Some(user) => {
                info!(user_id = %user.id, "session restored");
                Ok(Some(&self.principal.insert(Principal { user, token }).user))
            }
            None => {
                warn!("stored token no longer accepted");
                Ok(None)
            }
        }
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` for bad credentials and
    /// `AuthError::Gateway` for transport failures.
    #[instrument(skip_all, fields(%email))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&User, AuthError> {
        let token = self
            .gateway
            .login(email, password)
            .await
            .map_err(rejected)?;
        let user = self
            .gateway
            .current_user(&token)
            .await?
            .ok_or_else(|| AuthError::Rejected("token refused right after login".to_owned()))?;
        info!(user_id = %user.id, "logged in");
        Ok(&self.principal.insert(Principal { user, token }).user)
    }

    /// Creates an account and signs in with it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if registration or the subsequent login fails.
    #[instrument(skip_all, fields(email = %account.email))]
    pub async fn register(&mut self, account: &NewAccount) -> Result<&User, AuthError> {
        let created = self.gateway.register(account).await.map_err(rejected)?;
        info!(user_id = %created.id, "account created");
        self.login(&account.email, &account.password).await
    }

    /// Signs out.
    pub fn logout(&mut self) {
        if let Some(principal) = self.principal.take() {
            info!(user_id = %principal.user.id, "logged out");
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.principal.as_ref().map(|principal| &principal.user)
    }

    /// The signed-in principal, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

fn rejected(err: GatewayError) -> AuthError {
    match err {
        GatewayError::Backend(message) => AuthError::Rejected(message),
        GatewayError::Unauthenticated => AuthError::Rejected("not authenticated".to_owned()),
        other => AuthError::Gateway(other),
    }
}
