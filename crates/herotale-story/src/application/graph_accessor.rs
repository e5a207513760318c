//! Scenario graph accessor.
//!
//! Wraps a [`ScenarioGraphSource`] and hands out typed projections: a whole
//! [`ScenarioGraph`] per scenario, and ordered [`Choice`] lists per scene.

use std::sync::Arc;

use herotale_core::error::GatewayError;
use herotale_core::gateway::{ScenarioGraphSource, ScenarioSummary};
use herotale_core::ids::{ScenarioId, SceneId};
use tracing::{debug, instrument};

use crate::domain::graph::{Choice, GraphLookup, ScenarioGraph, order_choices};

/// Read-only access to scenarios, scenes and choices.
#[derive(Clone)]
pub struct GraphAccessor {
    source: Arc<dyn ScenarioGraphSource>,
}

impl GraphAccessor {
    /// Creates an accessor over a backend source.
    #[must_use]
    pub fn new(source: Arc<dyn ScenarioGraphSource>) -> Self {
        Self { source }
    }

    /// Lists the scenario catalogue.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    pub async fn list_scenarios(
        &self,
        published_only: bool,
    ) -> Result<Vec<ScenarioSummary>, GatewayError> {
        self.source.list_scenarios(published_only).await
    }

    /// Fetches a scenario's metadata.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    pub async fn scenario(&self, id: &ScenarioId) -> Result<Option<ScenarioSummary>, GatewayError> {
        self.source.scenario_by_id(id).await
    }

    /// Loads a scenario's metadata and scene set and projects them.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if either backend call fails. An unknown
    /// scenario is `Ok(GraphLookup::NotFound)`.
    #[instrument(skip_all, fields(scenario_id = %id))]
    pub async fn load_graph(&self, id: &ScenarioId) -> Result<GraphLookup, GatewayError> {
        let (scenario, scenes) = tokio::try_join!(
            self.source.scenario_by_id(id),
            self.source.scenes_by_scenario(id)
        )?;
        let Some(scenario) = scenario else {
            debug!("scenario unknown to backend");
            return Ok(GraphLookup::NotFound);
        };
        debug!(scenes = scenes.len(), "scene set fetched");
        Ok(GraphLookup::Found(ScenarioGraph::new(scenario, scenes)))
    }

    /// Loads a scene's choices in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    #[instrument(skip_all, fields(scene_id = %id))]
    pub async fn load_choices(&self, id: &SceneId) -> Result<Vec<Choice>, GatewayError> {
        let records = self.source.choices_by_scene(id).await?;
        Ok(order_choices(records))
    }
}
