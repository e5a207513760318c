//! Progress reads and writes.

use async_trait::async_trait;
use herotale_core::error::GatewayError;
use herotale_core::gateway::{Ack, ProgressLedger, ProgressRecord, TransitionEntry};
use herotale_core::identity::Principal;
use herotale_core::ids::{ProgressId, ScenarioId, SceneId};
use serde_json::json;
use tracing::instrument;

use crate::gateway::GraphqlGateway;
use crate::queries;
use crate::wire::{
    CreateProgressData, MyProgressData, ProgressByScenarioData, RecordProgressData,
    UpdateProgressData,
};

#[async_trait]
impl ProgressLedger for GraphqlGateway {
    #[instrument(skip_all, fields(user_id = %principal.user.id, %scenario_id))]
    async fn progress_for(
        &self,
        principal: &Principal,
        scenario_id: &ScenarioId,
    ) -> Result<Option<ProgressRecord>, GatewayError> {
        let data: ProgressByScenarioData = self
            .client
            .execute(
                "GetProgressByScenario",
                queries::GET_PROGRESS_BY_SCENARIO,
                json!({ "userId": principal.user.id, "scenarioId": scenario_id }),
                Some(&principal.token),
            )
            .await?;
        data.progress_by_user_and_scenario
            .map(ProgressRecord::try_from)
            .transpose()
    }

    #[instrument(skip_all, fields(user_id = %principal.user.id, %scenario_id))]
    async fn create_progress(
        &self,
        principal: &Principal,
        scenario_id: &ScenarioId,
        start_scene_id: &SceneId,
    ) -> Result<ProgressRecord, GatewayError> {
        let data: CreateProgressData = self
            .client
            .execute(
                "CreateProgress",
                queries::CREATE_PROGRESS,
                json!({
                    "input": {
                        "scenarioId": scenario_id,
                        "currentSceneId": start_scene_id,
                    }
                }),
                Some(&principal.token),
            )
            .await?;
        let payload = data.create_progress;
        if !payload.success {
            return Err(GatewayError::Backend(
                payload
                    .message
                    .unwrap_or_else(|| "progress was not created".to_owned()),
            ));
        }
        payload
            .progress
            .ok_or_else(|| GatewayError::Decode("createProgress returned no progress".to_owned()))?
            .try_into()
    }

    #[instrument(skip_all, fields(progress_id = %entry.progress_id, scene_id = %entry.scene_id))]
    async fn record_transition(
        &self,
        principal: &Principal,
        entry: &TransitionEntry,
    ) -> Result<Ack, GatewayError> {
        let data: RecordProgressData = self
            .client
            .execute(
                "RecordProgress",
                queries::RECORD_PROGRESS,
                json!({
                    "input": {
                        "progressId": entry.progress_id,
                        "sceneId": entry.scene_id,
                        "choiceId": entry.choice_id,
                        "metadata": entry.metadata,
                    }
                }),
                Some(&principal.token),
            )
            .await?;
        Ok(data.record_progress.into())
    }

    #[instrument(skip_all, fields(%progress_id, %scene_id))]
    async fn update_current_scene(
        &self,
        principal: &Principal,
        progress_id: &ProgressId,
        scene_id: &SceneId,
    ) -> Result<Ack, GatewayError> {
        let data: UpdateProgressData = self
            .client
            .execute(
                "UpdateProgress",
                queries::UPDATE_PROGRESS,
                json!({
                    "progressId": progress_id,
                    "input": { "currentSceneId": scene_id },
                }),
                Some(&principal.token),
            )
            .await?;
        Ok(data.update_progress.into())
    }

    #[instrument(skip_all, fields(user_id = %principal.user.id))]
    async fn my_progress(&self, principal: &Principal) -> Result<Vec<ProgressRecord>, GatewayError> {
        let data: MyProgressData = self
            .client
            .execute(
                "GetMyProgress",
                queries::GET_MY_PROGRESS,
                json!({}),
                Some(&principal.token),
            )
            .await?;
        data.my_progress
            .unwrap_or_default()
            .into_iter()
            .map(ProgressRecord::try_from)
            .collect()
    }
}
