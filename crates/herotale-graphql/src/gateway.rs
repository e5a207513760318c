//! Scenario graph reads.

use async_trait::async_trait;
use herotale_core::error::GatewayError;
use herotale_core::gateway::{ChoiceRecord, ScenarioGraphSource, ScenarioSummary, SceneRecord};
use herotale_core::ids::{ScenarioId, SceneId};
use serde_json::json;
use tracing::instrument;

use crate::client::GraphqlClient;
use crate::config::GraphqlConfig;
use crate::queries;
use crate::wire::{self, AllScenariosData, ChoicesData, ScenarioData, ScenesData};

/// The GraphQL backend, serving every engine port.
///
/// Scenario reads are anonymous; progress and identity operations carry the
/// principal's token.
#[derive(Debug, Clone)]
pub struct GraphqlGateway {
    pub(crate) client: GraphqlClient,
}

impl GraphqlGateway {
    /// Connects to the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &GraphqlConfig) -> Result<Self, GatewayError> {
        Ok(Self::from_client(GraphqlClient::new(config)?))
    }

    #[must_use]
    pub fn from_client(client: GraphqlClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScenarioGraphSource for GraphqlGateway {
    #[instrument(skip(self))]
    async fn list_scenarios(
        &self,
        published_only: bool,
    ) -> Result<Vec<ScenarioSummary>, GatewayError> {
        let data: AllScenariosData = self
            .client
            .execute(
                "GetAllScenarios",
                queries::GET_ALL_SCENARIOS,
                json!({ "publishedOnly": published_only }),
                None,
            )
            .await?;
        Ok(data
            .all_scenarios
            .unwrap_or_default()
            .into_iter()
            .map(ScenarioSummary::from)
            .collect())
    }

    #[instrument(skip_all, fields(scenario_id = %id))]
    async fn scenario_by_id(
        &self,
        id: &ScenarioId,
    ) -> Result<Option<ScenarioSummary>, GatewayError> {
        let data: ScenarioData = self
            .client
            .execute(
                "GetScenario",
                queries::GET_SCENARIO,
                json!({ "scenarioId": id }),
                None,
            )
            .await?;
        Ok(data.scenario_by_id.map(ScenarioSummary::from))
    }

    #[instrument(skip_all, fields(scenario_id = %id))]
    async fn scenes_by_scenario(&self, id: &ScenarioId) -> Result<Vec<SceneRecord>, GatewayError> {
        let data: ScenesData = self
            .client
            .execute(
                "GetScenesByScenario",
                queries::GET_SCENES_BY_SCENARIO,
                json!({ "scenarioId": id }),
                None,
            )
            .await?;
        Ok(data
            .scenes_by_scenario
            .unwrap_or_default()
            .into_iter()
            .map(SceneRecord::from)
            .collect())
    }

    #[instrument(skip_all, fields(scene_id = %id))]
    async fn choices_by_scene(&self, id: &SceneId) -> Result<Vec<ChoiceRecord>, GatewayError> {
        let data: ChoicesData = self
            .client
            .execute(
                "GetChoicesByScene",
                queries::GET_CHOICES_BY_SCENE,
                json!({ "sceneId": id }),
                None,
            )
            .await?;
        Ok(wire::choices(data.choices_by_scene.unwrap_or_default()))
    }
}
