//! In-memory `IdentityGateway`.

use std::sync::Mutex;

use async_trait::async_trait;
use herotale_core::error::GatewayError;
use herotale_core::identity::{AuthToken, IdentityGateway, NewAccount, User};
use herotale_core::ids::UserId;

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
    token: String,
}

/// Accepts a fixed set of accounts. Each account has exactly one token, which
/// is what `login` hands out and what `current_user` recognises.
#[derive(Debug, Default)]
pub struct StaticIdentityGateway {
    accounts: Mutex<Vec<Account>>,
}

impl StaticIdentityGateway {
    /// A gateway knowing a single account.
    #[must_use]
    pub fn with_user(user: User, password: &str, token: &str) -> Self {
        Self {
            accounts: Mutex::new(vec![Account {
                user,
                password: password.to_owned(),
                token: token.to_owned(),
            }]),
        }
    }
}

#[async_trait]
impl IdentityGateway for StaticIdentityGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthToken, GatewayError> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user.email == email && a.password == password)
            .map(|a| AuthToken::new(a.token.clone()))
            .ok_or_else(|| GatewayError::Backend("Invalid credentials".to_owned()))
    }

    async fn current_user(&self, token: &AuthToken) -> Result<Option<User>, GatewayError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.token == token.expose())
            .map(|a| a.user.clone()))
    }

    async fn register(&self, account: &NewAccount) -> Result<User, GatewayError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.user.email == account.email) {
            return Err(GatewayError::Backend(
                "User with this email already exists".to_owned(),
            ));
        }
        let n = accounts.len() + 1;
        let user = User {
            id: UserId::new(format!("u-{n}")),
            email: account.email.clone(),
            role: account.role.clone().unwrap_or_else(|| "player".to_owned()),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
        };
        accounts.push(Account {
            user: user.clone(),
            password: account.password.clone(),
            token: format!("tok-{n}"),
        });
        Ok(user)
    }
}
