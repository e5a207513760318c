//! Transition records shared between navigation and persistence.

use chrono::{DateTime, Utc};
use herotale_core::gateway::TransitionEntry;
use herotale_core::ids::{ChoiceId, ProgressId, ScenarioId, SceneId};
use serde::Serialize;
use uuid::Uuid;

/// Immutable record of one applied choice.
///
/// Created by the progression machine at the moment the scene pointer moves,
/// then handed (behind an `Arc`) to the persistence task. Nothing mutates it
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    /// Unique transition identifier.
    pub transition_id: Uuid,
    /// Correlation ID of the player action that caused it.
    pub correlation_id: Uuid,
    /// Scenario being played.
    pub scenario_id: ScenarioId,
    /// Progress record to append to; absent for anonymous play.
    pub progress_id: Option<ProgressId>,
    /// Scene the choice was made in.
    pub from_scene_id: SceneId,
    /// Choice taken.
    pub choice_id: ChoiceId,
    /// Scene arrived at.
    pub to_scene_id: SceneId,
    /// 1-based step number within the progress record, continuing after
    /// the saved history and across restarts.
    pub step: u32,
    /// When the choice was applied.
    pub occurred_at: DateTime<Utc>,
}

impl TransitionRecord {
    /// Metadata stored alongside the backend history entry.
    #[must_use]
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "fromSceneId": self.from_scene_id,
            "step": self.step,
            "transitionId": self.transition_id,
            "correlationId": self.correlation_id,
            "occurredAt": self.occurred_at.to_rfc3339(),
        })
    }

    /// Ledger input for this transition, when it belongs to a progress record.
    #[must_use]
    pub fn to_entry(&self) -> Option<TransitionEntry> {
        let progress_id = self.progress_id.clone()?;
        Some(TransitionEntry {
            progress_id,
            scene_id: self.to_scene_id.clone(),
            choice_id: Some(self.choice_id.clone()),
            metadata: self.metadata(),
        })
    }
}
