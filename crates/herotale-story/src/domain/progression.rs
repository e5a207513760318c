//! Scene progression state machine.
//!
//! The machine owns the player's position in a scenario graph and performs no
//! I/O. Every operation returns the [`Effect`]s its driver must carry out; the
//! outcomes come back through [`Progression::graph_fetched`],
//! [`Progression::progress_ensured`] and [`Progression::choices_fetched`],
//! each tagged with the ticket it was issued under. A ticket from an earlier
//! scenario selection, or from a scene visit the player already left, is
//! rejected with [`StaleResponse`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use herotale_core::clock::Clock;
use herotale_core::error::GatewayError;
use herotale_core::gateway::ScenarioSummary;
use herotale_core::ids::{ChoiceId, ProgressId, ScenarioId, SceneId};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::errors::{ActionError, StaleResponse, StoryFault};
use super::events::TransitionRecord;
use super::graph::{Choice, GraphLookup, Scene, ScenarioGraph};

/// Tag for an outstanding scene-graph fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphTicket {
    epoch: u64,
    scenario_id: ScenarioId,
}

impl GraphTicket {
    /// Scenario being fetched.
    #[must_use]
    pub fn scenario_id(&self) -> &ScenarioId {
        &self.scenario_id
    }
}

/// Tag for an outstanding progress lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTicket {
    epoch: u64,
}

/// Tag for an outstanding choice fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceTicket {
    epoch: u64,
    visit: u64,
    scene_id: SceneId,
}

impl ChoiceTicket {
    /// Scene whose choices are being fetched.
    #[must_use]
    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }
}

/// Work the driver must perform on behalf of the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Load the scene set of a scenario.
    FetchGraph(GraphTicket),
    /// Find or create the player's progress record.
    EnsureProgress {
        /// Ticket to answer with.
        ticket: ProgressTicket,
        /// Scenario being played.
        scenario_id: ScenarioId,
        /// Scene a new record starts at.
        start_scene_id: SceneId,
    },
    /// Load the choices of the scene just entered.
    FetchChoices(ChoiceTicket),
    /// Persist an applied transition. Fire-and-forget.
    RecordTransition(Arc<TransitionRecord>),
    /// Move the persisted position back to the start scene. Fire-and-forget.
    ResetProgress {
        /// Progress record to update.
        progress_id: ProgressId,
        /// New current scene.
        scene_id: SceneId,
    },
}

/// A player's persisted progress, as far as the machine cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressHandle {
    /// Progress record identifier.
    pub progress_id: ProgressId,
    /// Previously saved scene, when the record already existed.
    pub resume_scene_id: Option<SceneId>,
    /// Whether the saved run already reached an ending.
    pub is_completed: bool,
    /// Transitions already in the record's history.
    pub recorded_steps: u32,
}

/// Coarse state published to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No scenario selected.
    Idle,
    /// Scene graph or progress still loading.
    Loading,
    /// Graph loaded, waiting for `begin`.
    AwaitingStart,
    /// Playing a scene.
    InScene,
    /// The story ended.
    Terminal,
    /// A fault halted the session.
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::AwaitingStart => "awaiting start",
            Self::InScene => "in a scene",
            Self::Terminal => "at an ending",
            Self::Error => "failed",
        };
        f.write_str(name)
    }
}

/// Error shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Whether navigation is halted until a scenario is selected again.
    pub fatal: bool,
}

/// Read model consumed by presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryView {
    /// Coarse state.
    pub status: Status,
    /// Selected scenario.
    pub scenario_id: Option<ScenarioId>,
    /// Scenario metadata, once the graph has loaded.
    pub scenario: Option<ScenarioSummary>,
    /// Current scene.
    pub scene: Option<Scene>,
    /// Current choices in presentation order; `None` while still loading.
    pub choices: Option<Vec<Choice>>,
    /// Fatal fault or non-fatal choice fetch failure.
    pub error_detail: Option<ErrorDetail>,
    /// Choices taken since the last (re)start.
    pub steps: u32,
    /// Whether transitions are being persisted.
    pub persisted: bool,
}

#[derive(Debug, Clone)]
enum ChoiceSlot {
    Pending { error: Option<GatewayError> },
    Ready(Vec<Choice>),
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Loading,
    Reconciling,
    AwaitingStart,
    InScene { scene_id: SceneId, choices: ChoiceSlot },
    Terminal { scene_id: SceneId },
    Failed(StoryFault),
}

/// The scene progression state machine.
#[derive(Debug)]
pub struct Progression {
    auto_begin: bool,
    persist: bool,
    epoch: u64,
    visit: u64,
    scenario_id: Option<ScenarioId>,
    graph: Option<Arc<ScenarioGraph>>,
    start_scene_id: Option<SceneId>,
    choice_cache: HashMap<SceneId, Vec<Choice>>,
    progress_id: Option<ProgressId>,
    trail: Vec<Arc<TransitionRecord>>,
    steps_taken: u32,
    phase: Phase,
}

impl Progression {
    /// Creates an idle machine. With `auto_begin`, the start scene is entered
    /// as soon as it is known instead of waiting for `begin`.
    #[must_use]
    pub fn new(auto_begin: bool) -> Self {
        Self {
            auto_begin,
            persist: false,
            epoch: 0,
            visit: 0,
            scenario_id: None,
            graph: None,
            start_scene_id: None,
            choice_cache: HashMap::new(),
            progress_id: None,
            trail: Vec::new(),
            steps_taken: 0,
            phase: Phase::Idle,
        }
    }

    /// Coarse state.
    #[must_use]
    pub fn status(&self) -> Status {
        match self.phase {
            Phase::Idle => Status::Idle,
            Phase::Loading | Phase::Reconciling => Status::Loading,
            Phase::AwaitingStart => Status::AwaitingStart,
            Phase::InScene { .. } => Status::InScene,
            Phase::Terminal { .. } => Status::Terminal,
            Phase::Failed(_) => Status::Error,
        }
    }

    /// Selected scenario.
    #[must_use]
    pub fn scenario_id(&self) -> Option<&ScenarioId> {
        self.scenario_id.as_ref()
    }

    /// Loaded graph.
    #[must_use]
    pub fn graph(&self) -> Option<&ScenarioGraph> {
        self.graph.as_deref()
    }

    /// Identifier of the scene being shown, in or at the end of a story.
    #[must_use]
    pub fn current_scene_id(&self) -> Option<&SceneId> {
        match &self.phase {
            Phase::InScene { scene_id, .. } | Phase::Terminal { scene_id } => Some(scene_id),
            _ => None,
        }
    }

    /// Progress record transitions are persisted to.
    #[must_use]
    pub fn progress_id(&self) -> Option<&ProgressId> {
        self.progress_id.as_ref()
    }

    /// Transitions applied since the last (re)start, oldest first. For
    /// anonymous play this is the only record of the path taken.
    #[must_use]
    pub fn trail(&self) -> &[Arc<TransitionRecord>] {
        &self.trail
    }

    /// Fault that halted the session, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&StoryFault> {
        match &self.phase {
            Phase::Failed(fault) => Some(fault),
            _ => None,
        }
    }

    /// Starts loading a scenario. Everything known about the previous one is
    /// dropped, and answers still in flight for it become stale.
    pub fn select_scenario(&mut self, scenario_id: ScenarioId, persist: bool) -> Vec<Effect> {
        self.epoch += 1;
        self.persist = persist;
        self.scenario_id = Some(scenario_id.clone());
        self.graph = None;
        self.start_scene_id = None;
        self.choice_cache.clear();
        self.progress_id = None;
        self.trail.clear();
        self.steps_taken = 0;
        self.phase = Phase::Loading;

        info!(%scenario_id, epoch = self.epoch, persist, "scenario selected");
        vec![Effect::FetchGraph(GraphTicket {
            epoch: self.epoch,
            scenario_id,
        })]
    }

    /// Applies the outcome of a graph fetch.
    ///
    /// # Errors
    ///
    /// Returns `StaleResponse` when the ticket belongs to an earlier selection.
    pub fn graph_fetched(
        &mut self,
        ticket: &GraphTicket,
        result: Result<GraphLookup, GatewayError>,
    ) -> Result<Vec<Effect>, StaleResponse> {
        if ticket.epoch != self.epoch || !matches!(self.phase, Phase::Loading) {
            debug!(scenario_id = %ticket.scenario_id, "discarding stale scene graph");
            return Err(StaleResponse);
        }

        let graph = match result {
            Ok(GraphLookup::Found(graph)) => graph,
            Ok(GraphLookup::NotFound) => {
                return Ok(self.fail(StoryFault::ScenarioNotFound(ticket.scenario_id.clone())));
            }
            Err(err) => return Ok(self.fail(StoryFault::GraphFetch(err))),
        };

        let start_scene_id = match graph.start_scene() {
            Ok(scene) => scene.id.clone(),
            Err(fault) => return Ok(self.fail(fault)),
        };
        info!(
            scenario_id = %graph.id(),
            scenes = graph.scenes().len(),
            %start_scene_id,
            "scene graph loaded"
        );
        let scenario_id = graph.id().clone();
        self.graph = Some(Arc::new(graph));
        self.start_scene_id = Some(start_scene_id.clone());

        if self.persist {
            self.phase = Phase::Reconciling;
            return Ok(vec![Effect::EnsureProgress {
                ticket: ProgressTicket { epoch: self.epoch },
                scenario_id,
                start_scene_id,
            }]);
        }
        Ok(self.await_start())
    }

    /// Applies the outcome of a progress lookup. A failure is logged and
    /// play continues without persistence.
    ///
    /// # Errors
    ///
    /// Returns `StaleResponse` when the ticket belongs to an earlier selection.
    pub fn progress_ensured(
        &mut self,
        ticket: ProgressTicket,
        result: Result<ProgressHandle, GatewayError>,
    ) -> Result<Vec<Effect>, StaleResponse> {
        if ticket.epoch != self.epoch || !matches!(self.phase, Phase::Reconciling) {
            debug!("discarding stale progress lookup");
            return Err(StaleResponse);
        }

        match result {
            Ok(handle) => {
                debug!(progress_id = %handle.progress_id, "progress ready");
                self.progress_id = Some(handle.progress_id.clone());
                self.steps_taken = handle.recorded_steps;
                if let Some(scene_id) = self.resume_point(&handle) {
                    info!(%scene_id, "resuming saved progress");
                    return Ok(self.enter_scene(scene_id));
                }
            }
            Err(err) => {
                warn!(error = %err, "progress unavailable, continuing without persistence");
            }
        }
        Ok(self.await_start())
    }

    /// Enters the start scene.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::InvalidState` unless awaiting start.
    pub fn begin(&mut self) -> Result<Vec<Effect>, ActionError> {
        if !matches!(self.phase, Phase::AwaitingStart) {
            return Err(ActionError::InvalidState {
                action: "begin",
                status: self.status(),
            });
        }
        Ok(self.enter_start())
    }

    /// Applies the outcome of a choice fetch. A successful result is cached
    /// for the scene even when the player has moved on.
    ///
    /// # Errors
    ///
    /// Returns `StaleResponse` when the ticket is not for the current visit.
    pub fn choices_fetched(
        &mut self,
        ticket: &ChoiceTicket,
        result: Result<Vec<Choice>, GatewayError>,
    ) -> Result<(), StaleResponse> {
        if ticket.epoch != self.epoch {
            debug!(scene_id = %ticket.scene_id, "discarding choices from an earlier scenario");
            return Err(StaleResponse);
        }
        if let Ok(choices) = &result {
            self.choice_cache
                .insert(ticket.scene_id.clone(), choices.clone());
        }

        let current = ticket.visit == self.visit
            && matches!(
                &self.phase,
                Phase::InScene { scene_id, choices: ChoiceSlot::Pending { .. } }
                    if *scene_id == ticket.scene_id
            );
        if !current {
            debug!(scene_id = %ticket.scene_id, "discarding choices for a scene already left");
            return Err(StaleResponse);
        }

        let scene_id = ticket.scene_id.clone();
        self.phase = match result {
            Ok(choices) if choices.is_empty() => {
                info!(%scene_id, "scene has no outbound choices, story ended");
                Phase::Terminal { scene_id }
            }
            Ok(choices) => Phase::InScene {
                scene_id,
                choices: ChoiceSlot::Ready(choices),
            },
            Err(err) => {
                warn!(%scene_id, error = %err, "choice fetch failed");
                Phase::InScene {
                    scene_id,
                    choices: ChoiceSlot::Pending { error: Some(err) },
                }
            }
        };
        Ok(())
    }

    /// Takes one of the current scene's choices. The scene pointer moves
    /// before this returns; fetching the new scene's choices and persisting
    /// the transition are left to the returned effects.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::InvalidState` outside a scene,
    /// `ActionError::ChoicesNotReady` while choices load,
    /// `ActionError::UnknownChoice` for a choice not on offer, and
    /// `ActionError::Fault` when the destination is missing from the graph.
    pub fn choose(
        &mut self,
        choice_id: &ChoiceId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Vec<Effect>, ActionError> {
        let (from_scene_id, choice) = match &self.phase {
            Phase::InScene {
                scene_id,
                choices: ChoiceSlot::Ready(choices),
            } => {
                let choice = choices
                    .iter()
                    .find(|choice| &choice.id == choice_id)
                    .cloned()
                    .ok_or_else(|| ActionError::UnknownChoice(choice_id.clone()))?;
                (scene_id.clone(), choice)
            }
            Phase::InScene { .. } => return Err(ActionError::ChoicesNotReady),
            _ => {
                return Err(ActionError::InvalidState {
                    action: "choose",
                    status: self.status(),
                });
            }
        };

        let Some(graph) = self.graph.clone() else {
            return Err(ActionError::InvalidState {
                action: "choose",
                status: self.status(),
            });
        };
        if !graph.contains(&choice.to_scene_id) {
            let fault = StoryFault::DanglingChoice {
                choice_id: choice.id,
                to_scene_id: choice.to_scene_id,
            };
            self.fail(fault.clone());
            return Err(ActionError::Fault(fault));
        }

        // Numbering continues across restarts and from the saved history.
        self.steps_taken = self.steps_taken.saturating_add(1);
        let step = self.steps_taken;
        let record = Arc::new(TransitionRecord {
            transition_id: Uuid::new_v4(),
            correlation_id,
            scenario_id: graph.id().clone(),
            progress_id: self.progress_id.clone(),
            from_scene_id,
            choice_id: choice.id,
            to_scene_id: choice.to_scene_id.clone(),
            step,
            occurred_at: clock.now(),
        });
        info!(
            from = %record.from_scene_id,
            to = %record.to_scene_id,
            choice_id = %record.choice_id,
            step,
            "choice applied"
        );
        self.trail.push(Arc::clone(&record));

        let mut effects = self.enter_scene(choice.to_scene_id);
        if record.progress_id.is_some() {
            effects.push(Effect::RecordTransition(record));
        }
        Ok(effects)
    }

    /// Returns to the start of the loaded scenario without re-fetching it.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::InvalidState` unless in a scene or at an ending.
    pub fn restart(&mut self) -> Result<Vec<Effect>, ActionError> {
        if !matches!(self.phase, Phase::InScene { .. } | Phase::Terminal { .. }) {
            return Err(ActionError::InvalidState {
                action: "restart",
                status: self.status(),
            });
        }
        info!(steps = self.trail.len(), "restarting story");
        self.trail.clear();

        let mut effects = Vec::new();
        if let (Some(progress_id), Some(scene_id)) = (&self.progress_id, &self.start_scene_id) {
            effects.push(Effect::ResetProgress {
                progress_id: progress_id.clone(),
                scene_id: scene_id.clone(),
            });
        }
        effects.extend(self.await_start());
        Ok(effects)
    }

    /// Re-issues the current scene's choice fetch. A no-op once choices are
    /// ready.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::InvalidState` outside a scene.
    pub fn retry_choices(&mut self) -> Result<Vec<Effect>, ActionError> {
        let scene_id = match &self.phase {
            Phase::InScene {
                scene_id,
                choices: ChoiceSlot::Pending { .. },
            } => scene_id.clone(),
            Phase::InScene { .. } => return Ok(Vec::new()),
            _ => {
                return Err(ActionError::InvalidState {
                    action: "retry choices",
                    status: self.status(),
                });
            }
        };
        Ok(self.enter_scene(scene_id))
    }

    /// Builds the read model.
    #[must_use]
    pub fn view(&self) -> StoryView {
        let scene = self
            .current_scene_id()
            .and_then(|id| self.graph.as_ref().and_then(|graph| graph.scene(id)))
            .cloned();
        let choices = match &self.phase {
            Phase::InScene {
                choices: ChoiceSlot::Ready(choices),
                ..
            } => Some(choices.clone()),
            Phase::Terminal { .. } => Some(Vec::new()),
            _ => None,
        };
        let error_detail = match &self.phase {
            Phase::Failed(fault) => Some(ErrorDetail {
                code: fault.code(),
                message: fault.to_string(),
                fatal: true,
            }),
            Phase::InScene {
                choices: ChoiceSlot::Pending { error: Some(err) },
                ..
            } => Some(ErrorDetail {
                code: "choice_fetch",
                message: err.to_string(),
                fatal: false,
            }),
            _ => None,
        };

        StoryView {
            status: self.status(),
            scenario_id: self.scenario_id.clone(),
            scenario: self.graph.as_ref().map(|graph| graph.scenario().clone()),
            scene,
            choices,
            error_detail,
            steps: u32::try_from(self.trail.len()).unwrap_or(u32::MAX),
            persisted: self.progress_id.is_some(),
        }
    }

    fn resume_point(&self, handle: &ProgressHandle) -> Option<SceneId> {
        if handle.is_completed {
            return None;
        }
        let scene_id = handle.resume_scene_id.as_ref()?;
        if Some(scene_id) == self.start_scene_id.as_ref() {
            return None;
        }
        if !self.graph.as_ref().is_some_and(|graph| graph.contains(scene_id)) {
            warn!(%scene_id, "saved scene is not part of the scenario, starting over");
            return None;
        }
        Some(scene_id.clone())
    }

    fn await_start(&mut self) -> Vec<Effect> {
        self.phase = Phase::AwaitingStart;
        if self.auto_begin {
            return self.enter_start();
        }
        Vec::new()
    }

    fn enter_start(&mut self) -> Vec<Effect> {
        match self.start_scene_id.clone() {
            Some(scene_id) => self.enter_scene(scene_id),
            None => Vec::new(),
        }
    }

    fn enter_scene(&mut self, scene_id: SceneId) -> Vec<Effect> {
        self.visit += 1;

        let is_end = self
            .graph
            .as_ref()
            .and_then(|graph| graph.scene(&scene_id))
            .is_some_and(|scene| scene.is_end_scene);
        if is_end {
            info!(%scene_id, "end scene reached");
            self.phase = Phase::Terminal { scene_id };
            return Vec::new();
        }

        if let Some(cached) = self.choice_cache.get(&scene_id) {
            self.phase = if cached.is_empty() {
                Phase::Terminal { scene_id }
            } else {
                Phase::InScene {
                    scene_id,
                    choices: ChoiceSlot::Ready(cached.clone()),
                }
            };
            return Vec::new();
        }

        self.phase = Phase::InScene {
            scene_id: scene_id.clone(),
            choices: ChoiceSlot::Pending { error: None },
        };
        vec![Effect::FetchChoices(ChoiceTicket {
            epoch: self.epoch,
            visit: self.visit,
            scene_id,
        })]
    }

    fn fail(&mut self, fault: StoryFault) -> Vec<Effect> {
        error!(code = fault.code(), error = %fault, "story halted");
        self.phase = Phase::Failed(fault);
        Vec::new()
    }
}
