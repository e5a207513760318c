//! Login, registration and token checks.

use async_trait::async_trait;
use herotale_core::error::GatewayError;
use herotale_core::identity::{AuthToken, IdentityGateway, NewAccount, User};
use serde_json::json;
use tracing::{debug, instrument};

use crate::gateway::GraphqlGateway;
use crate::queries;
use crate::wire::{CreateUserData, LoginData, MeData};

#[async_trait]
impl IdentityGateway for GraphqlGateway {
    #[instrument(skip_all, fields(%email))]
    async fn login(&self, email: &str, password: &str) -> Result<AuthToken, GatewayError> {
        let data: LoginData = self
            .client
            .execute(
                "Login",
                queries::LOGIN,
                json!({ "email": email, "password": password }),
                None,
            )
            .await?;
        let payload = data.login;
        match payload.token {
            Some(token) if payload.success => Ok(AuthToken::new(token)),
            _ => Err(GatewayError::Backend(
                payload
                    .message
                    .unwrap_or_else(|| "Invalid credentials".to_owned()),
            )),
        }
    }

    #[instrument(skip_all)]
    async fn current_user(&self, token: &AuthToken) -> Result<Option<User>, GatewayError> {
        let result: Result<MeData, GatewayError> = self
            .client
            .execute("GetMe", queries::GET_ME, json!({}), Some(token))
            .await;
        match result {
            Ok(data) => Ok(data.me.map(User::from)),
            Err(GatewayError::Unauthenticated) => {
                debug!("token refused");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip_all, fields(email = %account.email))]
    async fn register(&self, account: &NewAccount) -> Result<User, GatewayError> {
        let data: CreateUserData = self
            .client
            .execute(
                "CreateUser",
                queries::CREATE_USER,
                json!({
                    "input": {
                        "email": account.email,
                        "password": account.password,
                        "role": account.role.as_deref().unwrap_or("player"),
                        "firstName": account.first_name,
                        "lastName": account.last_name,
                    }
                }),
                None,
            )
            .await?;
        let payload = data.create_user;
        match payload.user {
            Some(user) if payload.success => Ok(user.into()),
            _ => Err(GatewayError::Backend(
                payload
                    .message
                    .unwrap_or_else(|| "account was not created".to_owned()),
            )),
        }
    }
}
