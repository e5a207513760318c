//! Inventory reads.

use async_trait::async_trait;
use herotale_core::error::GatewayError;
use herotale_core::gateway::{AssetCatalog, AssetRecord};
use herotale_core::identity::Principal;
use serde_json::json;
use tracing::instrument;

use crate::gateway::GraphqlGateway;
use crate::queries;
use crate::wire::MyAssetsData;

#[async_trait]
impl AssetCatalog for GraphqlGateway {
    #[instrument(skip_all, fields(user_id = %principal.user.id))]
    async fn my_assets(&self, principal: &Principal) -> Result<Vec<AssetRecord>, GatewayError> {
        let data: MyAssetsData = self
            .client
            .execute(
                "GetMyAssets",
                queries::GET_MY_ASSETS,
                json!({}),
                Some(&principal.token),
            )
            .await?;
        Ok(data
            .my_assets
            .unwrap_or_default()
            .into_iter()
            .map(AssetRecord::from)
            .collect())
    }
}
