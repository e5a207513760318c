//! Typed projection of a scenario's scene graph.
//!
//! The backend delivers flat scene and choice lists. They are projected once,
//! at the accessor boundary, into a [`ScenarioGraph`] that the progression
//! machine reads for the rest of the session.

use std::collections::HashMap;

use herotale_core::gateway::{ChoiceRecord, MediaRef, ScenarioSummary, SceneRecord};
use herotale_core::ids::{ChoiceId, ScenarioId, SceneId};
use serde::Serialize;
use tracing::warn;

use super::errors::StoryFault;

/// Media attached to a scene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneMedia {
    /// Illustration.
    pub image: Option<MediaRef>,
    /// Narration audio.
    pub narration: Option<MediaRef>,
    /// Ambient music.
    pub music: Option<MediaRef>,
}

/// One narrative node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
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
    /// Attached media.
    pub media: SceneMedia,
}

impl From<SceneRecord> for Scene {
    fn from(record: SceneRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            text: record.text,
            order: record.order,
            is_start_scene: record.is_start_scene,
            is_end_scene: record.is_end_scene,
            media: SceneMedia {
                image: record.image,
                narration: record.narration,
                music: record.music,
            },
        }
    }
}

/// A labelled edge to another scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Choice identifier.
    pub id: ChoiceId,
    /// Display text.
    pub text: String,
    /// Sort key, ascending.
    pub order: i32,
    /// Destination scene.
    pub to_scene_id: SceneId,
}

impl From<ChoiceRecord> for Choice {
    fn from(record: ChoiceRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            order: record.order,
            to_scene_id: record.to_scene_id,
        }
    }
}

/// Converts backend choices into presentation order: ascending `order`, ties
/// kept in arrival order.
#[must_use]
pub fn order_choices(records: Vec<ChoiceRecord>) -> Vec<Choice> {
    let mut choices: Vec<Choice> = records.into_iter().map(Choice::from).collect();
    // `sort_by_key` is stable.
    choices.sort_by_key(|choice| choice.order);
    choices
}

/// Outcome of loading a scenario graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphLookup {
    /// The scenario exists.
    Found(ScenarioGraph),
    /// The backend does not know the scenario.
    NotFound,
}

/// Read-only snapshot of a scenario and its scenes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioGraph {
    scenario: ScenarioSummary,
    scenes: Vec<Scene>,
    index: HashMap<SceneId, usize>,
}

impl ScenarioGraph {
    /// Builds the projection. Duplicate scene ids keep their first occurrence.
    #[must_use]
    pub fn new(scenario: ScenarioSummary, records: Vec<SceneRecord>) -> Self {
        let mut scenes = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            if index.contains_key(&record.id) {
                warn!(scenario_id = %scenario.id, scene_id = %record.id, "duplicate scene ignored");
                continue;
            }
            index.insert(record.id.clone(), scenes.len());
            scenes.push(Scene::from(record));
        }
        Self {
            scenario,
            scenes,
            index,
        }
    }

    /// Scenario identifier.
    #[must_use]
    pub fn id(&self) -> &ScenarioId {
        &self.scenario.id
    }

    /// Scenario metadata.
    #[must_use]
    pub fn scenario(&self) -> &ScenarioSummary {
        &self.scenario
    }

    /// All scenes, in arrival order.
    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Looks up a scene.
    #[must_use]
    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.index.get(id).map(|&i| &self.scenes[i])
    }

    /// Whether the graph contains a scene.
    #[must_use]
    pub fn contains(&self, id: &SceneId) -> bool {
        self.index.contains_key(id)
    }

    /// Resolves the unique start-flagged scene.
    ///
    /// # Errors
    ///
    /// Returns `StoryFault::NoStartScene` when zero or several scenes carry the
    /// start flag. No scene is guessed in either case.
    pub fn start_scene(&self) -> Result<&Scene, StoryFault> {
        let mut flagged = self.scenes.iter().filter(|scene| scene.is_start_scene);
        match (flagged.next(), flagged.count()) {
            (Some(scene), 0) => Ok(scene),
            (None, _) => Err(StoryFault::NoStartScene { flagged: 0 }),
            (Some(_), rest) => Err(StoryFault::NoStartScene { flagged: rest + 1 }),
        }
    }
}
