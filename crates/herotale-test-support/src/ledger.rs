//! Test ledgers, mock `ProgressLedger` implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use herotale_core::error::GatewayError;
use herotale_core::gateway::{Ack, ProgressLedger, ProgressRecord, TransitionEntry};
use herotale_core::identity::Principal;
use herotale_core::ids::{ProgressId, ScenarioId, SceneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum WriteMode {
    #[default]
    Accept,
    Reject,
    Fail,
}

#[derive(Debug, Default)]
struct LedgerState {
    records: Vec<ProgressRecord>,
    created: Vec<(ScenarioId, SceneId)>,
    recorded: Vec<TransitionEntry>,
    resets: Vec<(ProgressId, SceneId)>,
}

/// An in-memory ledger that records every write it receives.
///
/// Created records start at their start scene and follow recorded
/// transitions and resets, so lookups after a write see the new position.
/// Write failures are configurable; lookups and creation always succeed.
#[derive(Debug, Default)]
pub struct RecordingProgressLedger {
    state: Mutex<LedgerState>,
    writes: WriteMode,
}

impl RecordingProgressLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing progress record.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_existing(self, record: ProgressRecord) -> Self {
        self.state.lock().unwrap().records.push(record);
        self
    }

    /// Transition and reset writes are answered with a negative ack.
    #[must_use]
    pub fn rejecting_writes(mut self) -> Self {
        self.writes = WriteMode::Reject;
        self
    }

    /// Transition and reset writes fail with a transport error.
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.writes = WriteMode::Fail;
        self
    }

    /// `(scenario, start scene)` of every created record.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn created(&self) -> Vec<(ScenarioId, SceneId)> {
        self.state.lock().unwrap().created.clone()
    }

    /// Every transition write attempted, accepted or not.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn recorded(&self) -> Vec<TransitionEntry> {
        self.state.lock().unwrap().recorded.clone()
    }

    /// Every reset write attempted, accepted or not.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn resets(&self) -> Vec<(ProgressId, SceneId)> {
        self.state.lock().unwrap().resets.clone()
    }

    fn answer(&self) -> Result<Ack, GatewayError> {
        match self.writes {
            WriteMode::Accept => Ok(Ack {
                success: true,
                message: "ok".to_owned(),
            }),
            WriteMode::Reject => Ok(Ack {
                success: false,
                message: "progress is locked".to_owned(),
            }),
            WriteMode::Fail => Err(GatewayError::Transport("connection reset".into())),
        }
    }

    fn move_to(state: &mut LedgerState, progress_id: &ProgressId, scene_id: &SceneId) {
        if let Some(record) = state.records.iter_mut().find(|r| &r.id == progress_id) {
            record.current_scene_id = Some(scene_id.clone());
        }
    }
}

#[async_trait]
impl ProgressLedger for RecordingProgressLedger {
    async fn progress_for(
        &self,
        _principal: &Principal,
        scenario_id: &ScenarioId,
    ) -> Result<Option<ProgressRecord>, GatewayError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| &r.scenario_id == scenario_id)
            .cloned())
    }

    async fn create_progress(
        &self,
        _principal: &Principal,
        scenario_id: &ScenarioId,
        start_scene_id: &SceneId,
    ) -> Result<ProgressRecord, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let record = ProgressRecord {
            id: ProgressId::new(format!("p-{}", state.records.len() + 1)),
            scenario_id: scenario_id.clone(),
            current_scene_id: Some(start_scene_id.clone()),
            is_completed: false,
            progress_percentage: Some(0.0),
            total_time_spent: Some(0),
            history: Vec::new(),
        };
        state
            .created
            .push((scenario_id.clone(), start_scene_id.clone()));
        state.records.push(record.clone());
        Ok(record)
    }

    async fn record_transition(
        &self,
        _principal: &Principal,
        entry: &TransitionEntry,
    ) -> Result<Ack, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.recorded.push(entry.clone());
        let answer = self.answer();
        if matches!(answer, Ok(Ack { success: true, .. })) {
            Self::move_to(&mut state, &entry.progress_id, &entry.scene_id);
        }
        answer
    }

    async fn update_current_scene(
        &self,
        _principal: &Principal,
        progress_id: &ProgressId,
        scene_id: &SceneId,
    ) -> Result<Ack, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.resets.push((progress_id.clone(), scene_id.clone()));
        let answer = self.answer();
        if matches!(answer, Ok(Ack { success: true, .. })) {
            Self::move_to(&mut state, progress_id, scene_id);
        }
        answer
    }

    async fn my_progress(&self, _principal: &Principal) -> Result<Vec<ProgressRecord>, GatewayError> {
        Ok(self.state.lock().unwrap().records.clone())
    }
}

/// A ledger whose every call fails with a transport error.
#[derive(Debug)]
pub struct FailingProgressLedger;

fn unreachable_backend() -> GatewayError {
    GatewayError::Transport("connection refused".into())
}

#[async_trait]
impl ProgressLedger for FailingProgressLedger {
    async fn progress_for(
        &self,
        _principal: &Principal,
        _scenario_id: &ScenarioId,
    ) -> Result<Option<ProgressRecord>, GatewayError> {
        Err(unreachable_backend())
    }

    async fn create_progress(
        &self,
        _principal: &Principal,
        _scenario_id: &ScenarioId,
        _start_scene_id: &SceneId,
    ) -> Result<ProgressRecord, GatewayError> {
        Err(unreachable_backend())
    }

    async fn record_transition(
        &self,
        _principal: &Principal,
        _entry: &TransitionEntry,
    ) -> Result<Ack, GatewayError> {
        Err(unreachable_backend())
    }

    async fn update_current_scene(
        &self,
        _principal: &Principal,
        _progress_id: &ProgressId,
        _scene_id: &SceneId,
    ) -> Result<Ack, GatewayError> {
        Err(unreachable_backend())
    }

    async fn my_progress(&self, _principal: &Principal) -> Result<Vec<ProgressRecord>, GatewayError> {
        Err(unreachable_backend())
    }
}
