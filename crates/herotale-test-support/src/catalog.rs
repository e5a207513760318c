//! In-memory `AssetCatalog`.

use std::collections::HashMap;

use async_trait::async_trait;
use herotale_core::error::GatewayError;
use herotale_core::gateway::{AssetCatalog, AssetRecord};
use herotale_core::identity::Principal;
use herotale_core::ids::UserId;

/// Serves per-user asset lists from memory. Users without an entry own
/// nothing.
#[derive(Debug, Default)]
pub struct InMemoryAssetCatalog {
    owned: HashMap<UserId, Vec<AssetRecord>>,
    unreachable: bool,
}

impl InMemoryAssetCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `assets` to `user_id`, in listing order.
    #[must_use]
    pub fn with_assets(mut self, user_id: impl Into<UserId>, assets: Vec<AssetRecord>) -> Self {
        self.owned.insert(user_id.into(), assets);
        self
    }

    /// Every lookup fails with a transport error.
    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

#[async_trait]
impl AssetCatalog for InMemoryAssetCatalog {
    async fn my_assets(&self, principal: &Principal) -> Result<Vec<AssetRecord>, GatewayError> {
        if self.unreachable {
            return Err(GatewayError::Transport("connection refused".into()));
        }
        Ok(self
            .owned
            .get(&principal.user.id)
            .cloned()
            .unwrap_or_default())
    }
}
