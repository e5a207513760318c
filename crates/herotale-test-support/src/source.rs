//! In-memory `ScenarioGraphSource`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herotale_core::error::GatewayError;
use herotale_core::gateway::{ChoiceRecord, ScenarioGraphSource, ScenarioSummary, SceneRecord};
use herotale_core::ids::{ScenarioId, SceneId};
use tokio::sync::Notify;

use crate::fixtures::ScenarioFixture;

/// Serves scenario fixtures from memory. Individual fetches can be made to
/// fail or held back until released, to exercise error and ordering paths.
#[derive(Debug, Default)]
pub struct InMemoryScenarioSource {
    scenarios: Vec<ScenarioFixture>,
    failing_scenes: Mutex<HashSet<ScenarioId>>,
    failing_choices: Mutex<HashSet<SceneId>>,
    panicking_choices: Mutex<HashSet<SceneId>>,
    held_scenes: Mutex<HashMap<ScenarioId, Arc<Notify>>>,
    scene_fetches: AtomicUsize,
    choice_fetches: AtomicUsize,
}

impl InMemoryScenarioSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scenario. Scenarios are listed in the order they were added.
    #[must_use]
    pub fn with_scenario(mut self, scenario: ScenarioFixture) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Makes scene fetches for `id` fail with a transport error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_scenes(&self, id: &ScenarioId) {
        self.failing_scenes.lock().unwrap().insert(id.clone());
    }

    /// Makes choice fetches for `id` fail with a transport error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_choices(&self, id: &SceneId) {
        self.failing_choices.lock().unwrap().insert(id.clone());
    }

    /// Undoes [`Self::fail_choices`].
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn restore_choices(&self, id: &SceneId) {
        self.failing_choices.lock().unwrap().remove(id);
    }

    /// Makes choice fetches for `id` panic instead of answering.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn panic_on_choices(&self, id: &SceneId) {
        self.panicking_choices.lock().unwrap().insert(id.clone());
    }

    /// Holds the next scene fetch for `id` until the returned gate is
    /// notified.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn hold_scenes(&self, id: &ScenarioId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held_scenes
            .lock()
            .unwrap()
            .insert(id.clone(), gate.clone());
        gate
    }

    /// Number of scene fetches served so far.
    pub fn scene_fetches(&self) -> usize {
        self.scene_fetches.load(Ordering::SeqCst)
    }

    /// Number of choice fetches served so far.
    pub fn choice_fetches(&self) -> usize {
        self.choice_fetches.load(Ordering::SeqCst)
    }

    fn find(&self, id: &ScenarioId) -> Option<&ScenarioFixture> {
        self.scenarios.iter().find(|s| &s.summary.id == id)
    }
}

fn refused() -> GatewayError {
    GatewayError::Transport("connection refused".into())
}

#[async_trait]
impl ScenarioGraphSource for InMemoryScenarioSource {
    async fn list_scenarios(
        &self,
        published_only: bool,
    ) -> Result<Vec<ScenarioSummary>, GatewayError> {
        Ok(self
            .scenarios
            .iter()
            .filter(|s| !published_only || s.summary.is_published)
            .map(|s| s.summary.clone())
            .collect())
    }

    async fn scenario_by_id(
        &self,
        id: &ScenarioId,
    ) -> Result<Option<ScenarioSummary>, GatewayError> {
        Ok(self.find(id).map(|s| s.summary.clone()))
    }

    async fn scenes_by_scenario(&self, id: &ScenarioId) -> Result<Vec<SceneRecord>, GatewayError> {
        let gate = self.held_scenes.lock().unwrap().remove(id);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.scene_fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing_scenes.lock().unwrap().contains(id) {
            return Err(refused());
        }
        Ok(self.find(id).map(|s| s.scenes.clone()).unwrap_or_default())
    }

    async fn choices_by_scene(&self, id: &SceneId) -> Result<Vec<ChoiceRecord>, GatewayError> {
        self.choice_fetches.fetch_add(1, Ordering::SeqCst);
        assert!(
            !self.panicking_choices.lock().unwrap().contains(id),
            "choice fetch for {id} panicked"
        );
        if self.failing_choices.lock().unwrap().contains(id) {
            return Err(refused());
        }
        Ok(self
            .scenarios
            .iter()
            .find_map(|s| s.choices.get(id).cloned())
            .unwrap_or_default())
    }
}
