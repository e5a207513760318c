//! The signed-in player's inventory.

use std::sync::Arc;

use herotale_core::error::GatewayError;
use herotale_core::gateway::{AssetCatalog, AssetRecord};
use herotale_core::identity::Principal;
use herotale_core::ids::AssetId;
use serde::Serialize;
use tracing::{debug, instrument};

/// One collected item, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryItem {
    pub id: AssetId,
    pub name: String,
    pub kind: String,
    /// Taken from the asset's `description` metadata, when present.
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

impl From<AssetRecord> for InventoryItem {
    fn from(asset: AssetRecord) -> Self {
        let description = asset
            .metadata
            .get("description")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        Self {
            id: asset.id,
            name: asset.name,
            kind: asset.kind,
            description,
            icon_url: asset.url,
        }
    }
}

/// Reads one principal's inventory.
#[derive(Clone)]
pub struct Inventory {
    catalog: Arc<dyn AssetCatalog>,
    principal: Principal,
}

impl Inventory {
    #[must_use]
    pub fn new(catalog: Arc<dyn AssetCatalog>, principal: Principal) -> Self {
        Self { catalog, principal }
    }

    /// Lists the principal's items in backend order.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the catalog cannot be read.
    #[instrument(skip_all, fields(user_id = %self.principal.user.id))]
    pub async fn items(&self) -> Result<Vec<InventoryItem>, GatewayError> {
        let assets = self.catalog.my_assets(&self.principal).await?;
        debug!(count = assets.len(), "inventory loaded");
        Ok(assets.into_iter().map(InventoryItem::from).collect())
    }
}
