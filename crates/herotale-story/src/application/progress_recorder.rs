//! Progress recorder.
//!
//! Persists a principal's position in a scenario to the remote ledger. Writes
//! are best-effort: the `spawn_*` helpers run them on their own task, log any
//! failure and never report back to the gameplay path.

use std::sync::Arc;

use herotale_core::error::GatewayError;
use herotale_core::gateway::{Ack, ProgressLedger, ProgressRecord};
use herotale_core::identity::Principal;
use herotale_core::ids::{ProgressId, ScenarioId, SceneId};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::domain::events::TransitionRecord;
use crate::domain::progression::ProgressHandle;

/// Records progress for one principal.
#[derive(Clone)]
pub struct ProgressRecorder {
    ledger: Arc<dyn ProgressLedger>,
    principal: Principal,
}

impl ProgressRecorder {
    /// Creates a recorder acting on behalf of `principal`.
    #[must_use]
    pub fn new(ledger: Arc<dyn ProgressLedger>, principal: Principal) -> Self {
        Self { ledger, principal }
    }

    /// The principal progress is recorded for.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Finds the principal's progress for a scenario, creating it at
    /// `start_scene_id` when there is none. Calling it again returns the same
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the lookup or the creation fails.
    #[instrument(skip_all, fields(user_id = %self.principal.user.id, %scenario_id))]
    pub async fn ensure_progress(
        &self,
        scenario_id: &ScenarioId,
        start_scene_id: &SceneId,
    ) -> Result<ProgressHandle, GatewayError> {
        if let Some(existing) = self
            .ledger
            .progress_for(&self.principal, scenario_id)
            .await?
        {
            debug!(progress_id = %existing.id, "existing progress found");
            return Ok(ProgressHandle {
                progress_id: existing.id,
                resume_scene_id: existing.current_scene_id,
                is_completed: existing.is_completed,
                recorded_steps: u32::try_from(existing.history.len()).unwrap_or(u32::MAX),
            });
        }

        let created = self
            .ledger
            .create_progress(&self.principal, scenario_id, start_scene_id)
            .await?;
        info!(progress_id = %created.id, "progress created");
        Ok(ProgressHandle {
            progress_id: created.id,
            resume_scene_id: None,
            is_completed: false,
            recorded_steps: 0,
        })
    }

    /// Appends a transition to its progress record.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Backend` when the record has no progress id or
    /// the backend acknowledges negatively, and any transport error as is.
    #[instrument(skip_all, fields(transition_id = %record.transition_id))]
    pub async fn record_transition(&self, record: &TransitionRecord) -> Result<Ack, GatewayError> {
        let entry = record
            .to_entry()
            .ok_or_else(|| GatewayError::Backend("transition has no progress record".to_owned()))?;
        let ack = self
            .ledger
            .record_transition(&self.principal, &entry)
            .await?;
        accepted(ack)
    }

    /// Moves the persisted position to `scene_id`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure or a negative ack.
    #[instrument(skip_all, fields(%progress_id, %scene_id))]
    pub async fn reset_to(
        &self,
        progress_id: &ProgressId,
        scene_id: &SceneId,
    ) -> Result<Ack, GatewayError> {
        let ack = self
            .ledger
            .update_current_scene(&self.principal, progress_id, scene_id)
            .await?;
        accepted(ack)
    }

    /// Lists every progress record of the principal.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    pub async fn my_progress(&self) -> Result<Vec<ProgressRecord>, GatewayError> {
        self.ledger.my_progress(&self.principal).await
    }

    /// Records a transition on a background task. Failures are logged.
    pub fn spawn_record(&self, record: Arc<TransitionRecord>, tasks: &mut JoinSet<()>) {
        let recorder = self.clone();
        tasks.spawn(async move {
            match recorder.record_transition(&record).await {
                Ok(_) => debug!(transition_id = %record.transition_id, "transition persisted"),
                Err(err) => warn!(
                    transition_id = %record.transition_id,
                    to_scene_id = %record.to_scene_id,
                    error = %err,
                    "failed to persist transition"
                ),
            }
        });
    }

    /// Resets the persisted position on a background task. Failures are
    /// logged.
    pub fn spawn_reset(&self, progress_id: ProgressId, scene_id: SceneId, tasks: &mut JoinSet<()>) {
        let recorder = self.clone();
        tasks.spawn(async move {
            if let Err(err) = recorder.reset_to(&progress_id, &scene_id).await {
                warn!(%progress_id, error = %err, "failed to reset progress");
            }
        });
    }
}

fn accepted(ack: Ack) -> Result<Ack, GatewayError> {
    if ack.success {
        Ok(ack)
    } else {
        Err(GatewayError::Backend(ack.message))
    }
}
