//! Backend ports.
//!
//! The scenario graph, player progress, inventories and accounts are owned by
//! a remote service. The records below are the wire-neutral shapes those
//! ports exchange; the story crate builds its typed projections from them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::identity::Principal;
use crate::ids::{AssetId, ChoiceId, ProgressId, ScenarioId, SceneId};

/// Catalogue entry for a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// Scenario identifier.
    pub id: ScenarioId,
    /// Display title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Whether the scenario is visible to players.
    pub is_published: bool,
    /// Creation time, when the backend reports it.
    pub created_at: Option<DateTime<Utc>>,
}

/// Reference to a media asset attached to a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Asset identifier.
    pub id: AssetId,
    /// Asset URL as reported by the backend (often relative).
    pub url: String,
}

/// A scene as delivered by the backend, without its choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Scene identifier.
    pub id: SceneId,
    /// Display title.
    pub title: String,
    /// Narrative text.
    pub text: String,
    /// Authoring order, informational only.
    pub order: Option<i32>,
    /// Start-of-story flag.
    pub is_start_scene: bool,
    /// End-of-story flag.
    pub is_end_scene: bool,
    /// Illustration.
    pub image: Option<MediaRef>,
    /// Narration audio.
    pub narration: Option<MediaRef>,
    /// Ambient music.
    pub music: Option<MediaRef>,
}

/// A choice as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    /// Choice identifier.
    pub id: ChoiceId,
    /// Display text.
    pub text: String,
    /// Sort key, ascending.
    pub order: i32,
    /// Destination scene.
    pub to_scene_id: SceneId,
}

/// One entry of a progress history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Scene reached.
    pub scene_id: SceneId,
    /// Choice that led there, absent for the initial entry.
    pub choice_id: Option<ChoiceId>,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
}

/// A player's persisted progress through one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Progress identifier.
    pub id: ProgressId,
    /// Scenario this progress belongs to.
    pub scenario_id: ScenarioId,
    /// Last persisted scene, if the backend has one.
    pub current_scene_id: Option<SceneId>,
    /// Whether the player reached an ending.
    pub is_completed: bool,
    /// Completion percentage computed by the backend.
    pub progress_percentage: Option<f64>,
    /// Total time spent, in seconds.
    pub total_time_spent: Option<u64>,
    /// Recorded history, oldest first. Empty when not requested.
    pub history: Vec<HistoryEntry>,
}

/// Input for appending one transition to a progress record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionEntry {
    /// Progress record to append to.
    pub progress_id: ProgressId,
    /// Scene the player arrived at.
    pub scene_id: SceneId,
    /// Choice that was taken.
    pub choice_id: Option<ChoiceId>,
    /// Free-form metadata stored with the history entry.
    pub metadata: serde_json::Value,
}

/// Acknowledgement returned by progress mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the backend applied the mutation.
    pub success: bool,
    /// Backend message.
    pub message: String,
}

/// An asset owned by a player (an inventory item).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Asset identifier.
    pub id: AssetId,
    /// Display name.
    pub name: String,
    /// Backend asset type, e.g. `image` or `item`.
    pub kind: String,
    /// Asset URL, often relative.
    pub url: Option<String>,
    /// Free-form metadata; `Null` when the backend has none.
    pub metadata: serde_json::Value,
}

/// Read-only access to the story graph.
#[async_trait]
pub trait ScenarioGraphSource: Send + Sync {
    /// Lists scenarios, optionally restricted to published ones.
    async fn list_scenarios(&self, published_only: bool)
    -> Result<Vec<ScenarioSummary>, GatewayError>;

    /// Fetches one scenario's metadata. `Ok(None)` when the id is unknown.
    async fn scenario_by_id(&self, id: &ScenarioId)
    -> Result<Option<ScenarioSummary>, GatewayError>;

    /// Fetches every scene of a scenario, media references included.
    async fn scenes_by_scenario(&self, id: &ScenarioId) -> Result<Vec<SceneRecord>, GatewayError>;

    /// Fetches the outbound choices of a scene, in backend order.
    async fn choices_by_scene(&self, id: &SceneId) -> Result<Vec<ChoiceRecord>, GatewayError>;
}

/// Remote ledger of player progress, keyed by user and scenario.
#[async_trait]
pub trait ProgressLedger: Send + Sync {
    /// Looks up the principal's progress for a scenario.
    async fn progress_for(
        &self,
        principal: &Principal,
        scenario_id: &ScenarioId,
    ) -> Result<Option<ProgressRecord>, GatewayError>;

    /// Creates a progress record positioned at `start_scene_id`.
    async fn create_progress(
        &self,
        principal: &Principal,
        scenario_id: &ScenarioId,
        start_scene_id: &SceneId,
    ) -> Result<ProgressRecord, GatewayError>;

    /// Appends a transition to a progress record.
    async fn record_transition(
        &self,
        principal: &Principal,
        entry: &TransitionEntry,
    ) -> Result<Ack, GatewayError>;

    /// Moves a progress record's current scene without adding history.
    async fn update_current_scene(
        &self,
        principal: &Principal,
        progress_id: &ProgressId,
        scene_id: &SceneId,
    ) -> Result<Ack, GatewayError>;

    /// Lists all progress records of the principal.
    async fn my_progress(&self, principal: &Principal) -> Result<Vec<ProgressRecord>, GatewayError>;
}

/// The assets a player has collected.
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    /// Lists every asset owned by the principal.
    async fn my_assets(&self, principal: &Principal) -> Result<Vec<AssetRecord>, GatewayError>;
}
