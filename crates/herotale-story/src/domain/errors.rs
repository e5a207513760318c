//! Error types for story progression.

use herotale_core::error::GatewayError;
use herotale_core::ids::{ChoiceId, ScenarioId, SceneId};
use thiserror::Error;

use super::progression::Status;

/// A condition that halts the session until a scenario is selected again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryFault {
    /// The scene set could not be loaded.
    #[error("failed to load scenario graph: {0}")]
    GraphFetch(GatewayError),

    /// The backend does not know the scenario.
    #[error("scenario not found: {0}")]
    ScenarioNotFound(ScenarioId),

    /// Zero or several scenes carry the start flag.
    #[error("scenario has {flagged} scenes flagged as start, expected exactly one")]
    NoStartScene {
        /// How many scenes were flagged.
        flagged: usize,
    },

    /// A choice points at a scene that is not part of the graph.
    #[error("choice {choice_id} leads to unknown scene {to_scene_id}")]
    DanglingChoice {
        /// The offending choice.
        choice_id: ChoiceId,
        /// The missing destination.
        to_scene_id: SceneId,
    },
}

impl StoryFault {
    /// Machine-readable code for the read model.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::GraphFetch(_) => "graph_fetch",
            Self::ScenarioNotFound(_) => "scenario_not_found",
            Self::NoStartScene { .. } => "no_start_scene",
            Self::DanglingChoice { .. } => "dangling_choice",
        }
    }
}

/// A player action that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The action is not available in the current state.
    #[error("cannot {action} while {status}")]
    InvalidState {
        /// The attempted action.
        action: &'static str,
        /// The state the machine was in.
        status: Status,
    },

    /// The choice is not offered by the current scene.
    #[error("choice {0} is not offered in the current scene")]
    UnknownChoice(ChoiceId),

    /// The current scene's choices have not settled yet.
    #[error("choices for the current scene are still loading")]
    ChoicesNotReady,

    /// The action exposed a data-integrity fault; the session is now failed.
    #[error(transparent)]
    Fault(#[from] StoryFault),
}

/// A fetch result that arrived for a scenario or scene the player has
/// already left. Never shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stale response discarded")]
pub struct StaleResponse;
