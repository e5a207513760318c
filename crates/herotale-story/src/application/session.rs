//! Play session.
//!
//! A [`StorySession`] is the single owner of a [`Progression`] machine. It
//! carries out the machine's effects on spawned tasks, but those tasks never
//! touch the machine: fetch results come back over a channel and are applied
//! only when the session is polled, so every state change happens on the
//! caller's task. Persistence writes are fire-and-forget and report nothing
//! back.
//!
//! All methods that issue effects must be called from within a Tokio runtime.

use std::sync::Arc;

use herotale_core::clock::Clock;
use herotale_core::command::Command;
use herotale_core::error::GatewayError;
use herotale_core::gateway::ProgressLedger;
use herotale_core::identity::Principal;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::application::auth::AuthContext;
use crate::application::graph_accessor::GraphAccessor;
use crate::application::progress_recorder::ProgressRecorder;
use crate::domain::commands::{BeginStory, MakeChoice, RestartStory, RetryChoices, SelectScenario};
use crate::domain::errors::ActionError;
use crate::domain::graph::{Choice, GraphLookup};
use crate::domain::progression::{
    ChoiceTicket, Effect, GraphTicket, ProgressHandle, ProgressTicket, Progression, StoryView,
};

/// Session behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Enter the start scene as soon as it is known.
    pub auto_begin: bool,
}

#[derive(Debug)]
enum Completion {
    Graph(GraphTicket, Result<GraphLookup, GatewayError>),
    Progress(ProgressTicket, Result<ProgressHandle, GatewayError>),
    Choices(ChoiceTicket, Result<Vec<Choice>, GatewayError>),
}

/// One player's run through a scenario.
pub struct StorySession {
    machine: Progression,
    accessor: GraphAccessor,
    recorder: Option<ProgressRecorder>,
    clock: Arc<dyn Clock>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    persistence: JoinSet<()>,
}

impl StorySession {
    /// Creates a session. Without a principal, play is memory-only and the
    /// ledger is never called.
    #[must_use]
    pub fn new(
        accessor: GraphAccessor,
        ledger: Arc<dyn ProgressLedger>,
        principal: Option<Principal>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            machine: Progression::new(config.auto_begin),
            accessor,
            recorder: principal.map(|principal| ProgressRecorder::new(ledger, principal)),
            clock,
            completions_tx,
            completions_rx,
            in_flight: 0,
            persistence: JoinSet::new(),
        }
    }

    /// Creates a session for whoever is signed in to `auth` right now.
    #[must_use]
    pub fn for_context(
        accessor: GraphAccessor,
        ledger: Arc<dyn ProgressLedger>,
        auth: &AuthContext,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self::new(accessor, ledger, auth.principal().cloned(), clock, config)
    }

    /// Current read model.
    #[must_use]
    pub fn view(&self) -> StoryView {
        self.machine.view()
    }

    /// The underlying machine.
    #[must_use]
    pub fn machine(&self) -> &Progression {
        &self.machine
    }

    /// Number of fetches whose results have not been applied yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Loads a scenario, abandoning the current one.
    #[instrument(skip_all, fields(correlation_id = %command.correlation_id, scenario_id = %command.scenario_id))]
    pub fn select_scenario(&mut self, command: &SelectScenario) -> StoryView {
        info!(command = command.command_type(), "handling player action");
        let persist = self.recorder.is_some();
        let effects = self
            .machine
            .select_scenario(command.scenario_id.clone(), persist);
        self.dispatch(effects);
        self.view()
    }

    /// Enters the start scene.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` if the story is not awaiting start.
    #[instrument(skip_all, fields(correlation_id = %command.correlation_id))]
    pub fn begin(&mut self, command: &BeginStory) -> Result<StoryView, ActionError> {
        info!(command = command.command_type(), "handling player action");
        let effects = self.machine.begin()?;
        self.dispatch(effects);
        Ok(self.view())
    }

    /// Takes a choice. The returned view already shows the destination scene.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` if the choice cannot be taken now.
    #[instrument(skip_all, fields(correlation_id = %command.correlation_id, choice_id = %command.choice_id))]
    pub fn choose(&mut self, command: &MakeChoice) -> Result<StoryView, ActionError> {
        info!(command = command.command_type(), "handling player action");
        let effects =
            self.machine
                .choose(&command.choice_id, command.correlation_id, self.clock.as_ref())?;
        let view = self.view();
        self.dispatch(effects);
        Ok(view)
    }

    /// Returns to the start of the loaded scenario.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` unless in a scene or at an ending.
    #[instrument(skip_all, fields(correlation_id = %command.correlation_id))]
    pub fn restart(&mut self, command: &RestartStory) -> Result<StoryView, ActionError> {
        info!(command = command.command_type(), "handling player action");
        let effects = self.machine.restart()?;
        self.dispatch(effects);
        Ok(self.view())
    }

    /// Fetches the current scene's choices again.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` outside a scene.
    #[instrument(skip_all, fields(correlation_id = %command.correlation_id))]
    pub fn retry_choices(&mut self, command: &RetryChoices) -> Result<StoryView, ActionError> {
        info!(command = command.command_type(), "handling player action");
        let effects = self.machine.retry_choices()?;
        self.dispatch(effects);
        Ok(self.view())
    }

    /// Applies every fetch result that has already arrived, without waiting.
    /// Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Waits for the next fetch result and applies it. Returns `None` when
    /// nothing is in flight.
    pub async fn next_update(&mut self) -> Option<StoryView> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.completions_rx.recv().await?;
        self.apply(completion);
        Some(self.view())
    }

    /// Applies results until nothing is in flight.
    pub async fn settle(&mut self) -> StoryView {
        while self.next_update().await.is_some() {}
        self.view()
    }

    /// Waits for outstanding progress writes. Gameplay never needs this; it
    /// exists for orderly shutdown and tests.
    pub async fn flush_persistence(&mut self) {
        while self.persistence.join_next().await.is_some() {}
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let outcome = match completion {
            Completion::Graph(ticket, result) => self.machine.graph_fetched(&ticket, result),
            Completion::Progress(ticket, result) => self.machine.progress_ensured(ticket, result),
            Completion::Choices(ticket, result) => self
                .machine
                .choices_fetched(&ticket, result)
                .map(|()| Vec::new()),
        };
        match outcome {
            Ok(effects) => self.dispatch(effects),
            Err(stale) => debug!(%stale, "ignored late fetch result"),
        }
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        while let Some(finished) = self.persistence.try_join_next() {
            if let Err(err) = finished {
                warn!(error = %err, "progress write task failed");
            }
        }
        for effect in effects {
            match effect {
                Effect::FetchGraph(ticket) => {
                    let accessor = self.accessor.clone();
                    let fallback = ticket.clone();
                    self.spawn_fetch(
                        async move {
                            let result = accessor.load_graph(ticket.scenario_id()).await;
                            Completion::Graph(ticket, result)
                        },
                        move |err| Completion::Graph(fallback, Err(err)),
                    );
                }
                Effect::FetchChoices(ticket) => {
                    let accessor = self.accessor.clone();
                    let fallback = ticket.clone();
                    self.spawn_fetch(
                        async move {
                            let result = accessor.load_choices(ticket.scene_id()).await;
                            Completion::Choices(ticket, result)
                        },
                        move |err| Completion::Choices(fallback, Err(err)),
                    );
                }
                Effect::EnsureProgress {
                    ticket,
                    scenario_id,
                    start_scene_id,
                } => {
                    let recorder = self.recorder.clone();
                    self.spawn_fetch(
                        async move {
                            let result = match recorder {
                                Some(recorder) => {
                                    recorder.ensure_progress(&scenario_id, &start_scene_id).await
                                }
                                None => Err(GatewayError::Unauthenticated),
                            };
                            Completion::Progress(ticket, result)
                        },
                        move |err| Completion::Progress(ticket, Err(err)),
                    );
                }
                Effect::RecordTransition(record) => {
                    if let Some(recorder) = &self.recorder {
                        recorder.spawn_record(record, &mut self.persistence);
                    }
                }
                Effect::ResetProgress {
                    progress_id,
                    scene_id,
                } => {
                    if let Some(recorder) = &self.recorder {
                        recorder.spawn_reset(progress_id, scene_id, &mut self.persistence);
                    }
                }
            }
        }
    }

    /// Runs `fetch` on its own task. Should that task die without an answer,
    /// `on_abort` supplies a failed completion so `in_flight` still drains.
    fn spawn_fetch<F, A>(&mut self, fetch: F, on_abort: A)
    where
        F: Future<Output = Completion> + Send + 'static,
        A: FnOnce(GatewayError) -> Completion + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.completions_tx.clone();
        let task = tokio::spawn(fetch);
        tokio::spawn(async move {
            let completion = match task.await {
                Ok(completion) => completion,
                Err(err) => {
                    warn!(error = %err, "fetch task aborted");
                    on_abort(GatewayError::Transport(format!("fetch task aborted: {err}")))
                }
            };
            if tx.send(completion).is_err() {
                debug!("session closed before fetch completed");
            }
        });
    }
}

impl Drop for StorySession {
    fn drop(&mut self) {
        // Let pending progress writes finish on their own.
        self.persistence.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use herotale_core::ids::{ChoiceId, ProgressId, ScenarioId, SceneId};
    use herotale_test_support::fixtures;
    use herotale_test_support::{FixedClock, InMemoryScenarioSource, RecordingProgressLedger};
    use uuid::Uuid;

    use crate::domain::progression::Status;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ))
    }

    fn session(
        source: Arc<InMemoryScenarioSource>,
        ledger: Arc<RecordingProgressLedger>,
        principal: Option<Principal>,
    ) -> StorySession {
        StorySession::new(
            GraphAccessor::new(source),
            ledger,
            principal,
            clock(),
            SessionConfig::default(),
        )
    }

    fn s1_source() -> Arc<InMemoryScenarioSource> {
        Arc::new(
            InMemoryScenarioSource::new()
                .with_scenario(fixtures::s1())
                .with_scenario(fixtures::two_step("X")),
        )
    }

    fn select(id: &str) -> SelectScenario {
        SelectScenario {
            correlation_id: Uuid::new_v4(),
            scenario_id: ScenarioId::from(id),
        }
    }

    fn begin() -> BeginStory {
        BeginStory {
            correlation_id: Uuid::new_v4(),
        }
    }

    fn choose(id: &str) -> MakeChoice {
        MakeChoice {
            correlation_id: Uuid::new_v4(),
            choice_id: ChoiceId::from(id),
        }
    }

    fn restart() -> RestartStory {
        RestartStory {
            correlation_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_anonymous_play_through_s1() {
        // Arrange
        let ledger = Arc::new(RecordingProgressLedger::new());
        let mut session = session(s1_source(), ledger.clone(), None);

        // Act / Assert: load
        assert_eq!(session.select_scenario(&select("S1")).status, Status::Loading);
        assert_eq!(session.settle().await.status, Status::AwaitingStart);

        // begin: start scene shows at once, choices follow
        let view = session.begin(&begin()).unwrap();
        assert_eq!(view.scene.as_ref().unwrap().id, SceneId::from("A"));
        assert_eq!(view.choices, None);
        let view = session.settle().await;
        let texts: Vec<String> = view.choices.unwrap().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["go south", "go north"]);

        // choose "go south": lands on C before anything else happens
        let view = session.choose(&choose("south")).unwrap();
        assert_eq!(view.scene.unwrap().id, SceneId::from("C"));
        assert_eq!(view.status, Status::Terminal);
        assert_eq!(session.pending(), 0);

        session.flush_persistence().await;
        assert!(ledger.recorded().is_empty(), "anonymous play is never persisted");
    }

    #[tokio::test]
    async fn test_restart_from_terminal_returns_to_start_without_refetch() {
        // Arrange
        let source = s1_source();
        let mut session = session(source.clone(), Arc::new(RecordingProgressLedger::new()), None);
        session.select_scenario(&select("S1"));
        session.settle().await;
        session.begin(&begin()).unwrap();
        session.settle().await;
        session.choose(&choose("south")).unwrap();
        let graph_loads = source.scene_fetches();

        // Act
        let view = session.restart(&restart()).unwrap();
        assert_eq!(view.status, Status::AwaitingStart);
        let view = session.begin(&begin()).unwrap();

        // Assert
        assert_eq!(view.scene.unwrap().id, SceneId::from("A"));
        assert_eq!(view.choices.unwrap().len(), 2);
        assert_eq!(session.pending(), 0);
        assert_eq!(source.scene_fetches(), graph_loads);
    }

    #[tokio::test]
    async fn test_switching_scenario_mid_fetch_discards_stale_graph() {
        // Arrange
        let source = s1_source();
        let gate = source.hold_scenes(&"X".into());
        let mut session = session(source, Arc::new(RecordingProgressLedger::new()), None);

        // Act
        session.select_scenario(&select("X"));
        session.select_scenario(&select("S1"));
        let view = session.next_update().await.unwrap();

        // Assert: S1 applied while X is still held
        assert_eq!(view.status, Status::AwaitingStart);
        assert_eq!(view.scenario.unwrap().id, ScenarioId::from("S1"));

        // X finally answers and is dropped
        gate.notify_one();
        let view = session.settle().await;
        assert_eq!(view.scenario_id, Some(ScenarioId::from("S1")));
        assert_eq!(view.scenario.unwrap().id, ScenarioId::from("S1"));
        assert_eq!(view.status, Status::AwaitingStart);
    }

    #[tokio::test]
    async fn test_choice_applies_even_when_progress_write_fails() {
        // Arrange
        let ledger = Arc::new(RecordingProgressLedger::new().failing_writes());
        let mut session = session(s1_source(), ledger.clone(), Some(fixtures::principal()));
        session.select_scenario(&select("S1"));
        let view = session.settle().await;
        assert_eq!(view.status, Status::AwaitingStart);
        assert!(view.persisted);
        session.begin(&begin()).unwrap();
        session.settle().await;

        // Act
        let view = session.choose(&choose("south")).unwrap();

        // Assert
        assert_eq!(view.scene.as_ref().unwrap().id, SceneId::from("C"));
        session.flush_persistence().await;
        let view = session.view();
        assert_eq!(view.status, Status::Terminal);
        assert_eq!(view.scene.unwrap().id, SceneId::from("C"));
        assert_eq!(view.error_detail, None);
        assert_eq!(ledger.recorded().len(), 1, "the write was attempted");
    }

    #[tokio::test]
    async fn test_authenticated_choice_is_recorded_against_progress() {
        // Arrange
        let ledger = Arc::new(RecordingProgressLedger::new());
        let mut session = session(s1_source(), ledger.clone(), Some(fixtures::principal()));
        session.select_scenario(&select("S1"));
        session.settle().await;
        session.begin(&begin()).unwrap();
        session.settle().await;

        // Act
        session.choose(&choose("north")).unwrap();
        session.flush_persistence().await;

        // Assert
        let recorded = ledger.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].scene_id, SceneId::from("B"));
        assert_eq!(recorded[0].choice_id, Some(ChoiceId::from("north")));
        assert_eq!(Some(&recorded[0].progress_id), session.machine().progress_id());
    }

    #[tokio::test]
    async fn test_saved_progress_resumes_where_player_left() {
        // Arrange
        let ledger = Arc::new(
            RecordingProgressLedger::new().with_existing(fixtures::progress("p-9", "S1", "B")),
        );
        let mut session = session(s1_source(), ledger, Some(fixtures::principal()));

        // Act
        session.select_scenario(&select("S1"));
        let view = session.settle().await;

        // Assert: B has no choices, so the resumed run is already over
        assert_eq!(view.scene.unwrap().id, SceneId::from("B"));
        assert_eq!(view.status, Status::Terminal);
        assert_eq!(session.machine().progress_id(), Some(&ProgressId::from("p-9")));
    }

    #[tokio::test]
    async fn test_restart_resets_persisted_position() {
        // Arrange
        let ledger = Arc::new(RecordingProgressLedger::new());
        let mut session = session(s1_source(), ledger.clone(), Some(fixtures::principal()));
        session.select_scenario(&select("S1"));
        session.settle().await;
        session.begin(&begin()).unwrap();
        session.settle().await;
        session.choose(&choose("south")).unwrap();

        // Act
        session.restart(&restart()).unwrap();
        session.flush_persistence().await;

        // Assert
        let resets = ledger.resets();
        assert_eq!(resets.len(), 1);
        assert_eq!(resets[0].1, SceneId::from("A"));
    }

    #[tokio::test]
    async fn test_graph_failure_blocks_navigation() {
        let source = s1_source();
        source.fail_scenes(&"S1".into());
        let mut session = session(source, Arc::new(RecordingProgressLedger::new()), None);

        session.select_scenario(&select("S1"));
        let view = session.settle().await;

        assert_eq!(view.status, Status::Error);
        assert_eq!(view.error_detail.unwrap().code, "graph_fetch");
        assert!(session.begin(&begin()).is_err());
    }

    #[tokio::test]
    async fn test_choice_fetch_failure_can_be_retried() {
        // Arrange
        let source = s1_source();
        source.fail_choices(&"A".into());
        let mut session = session(source.clone(), Arc::new(RecordingProgressLedger::new()), None);
        session.select_scenario(&select("S1"));
        session.settle().await;
        session.begin(&begin()).unwrap();
        let view = session.settle().await;
        assert_eq!(view.status, Status::InScene);
        assert_eq!(view.choices, None);
        assert_eq!(view.error_detail.unwrap().code, "choice_fetch");

        // Act
        source.restore_choices(&"A".into());
        session
            .retry_choices(&RetryChoices {
                correlation_id: Uuid::new_v4(),
            })
            .unwrap();
        let view = session.settle().await;

        // Assert
        assert_eq!(view.error_detail, None);
        assert_eq!(view.choices.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_auto_begin_session_lands_in_start_scene() {
        let mut session = StorySession::new(
            GraphAccessor::new(s1_source()),
            Arc::new(RecordingProgressLedger::new()),
            None,
            clock(),
            SessionConfig { auto_begin: true },
        );

        session.select_scenario(&select("S1"));
        let view = session.settle().await;

        assert_eq!(view.status, Status::InScene);
        assert_eq!(view.scene.unwrap().id, SceneId::from("A"));
        assert_eq!(view.choices.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_poll_applies_only_arrived_results() {
        let mut session = session(s1_source(), Arc::new(RecordingProgressLedger::new()), None);
        session.select_scenario(&select("S1"));

        while session.pending() > 0 {
            tokio::task::yield_now().await;
            session.poll();
        }

        assert_eq!(session.view().status, Status::AwaitingStart);
    }

    #[tokio::test]
    async fn test_finished_progress_writes_are_released() {
        // Arrange
        let ledger = Arc::new(RecordingProgressLedger::new());
        let mut session = session(s1_source(), ledger.clone(), Some(fixtures::principal()));
        session.select_scenario(&select("S1"));
        session.settle().await;

        // Act: each round persists one transition and one reset
        for _ in 0..20 {
            session.begin(&begin()).unwrap();
            session.settle().await;
            session.choose(&choose("south")).unwrap();
            session.restart(&restart()).unwrap();
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
        }

        // Assert
        assert!(
            session.persistence.len() <= 2,
            "{} write tasks retained",
            session.persistence.len()
        );
        session.flush_persistence().await;
        assert_eq!(ledger.recorded().len(), 20);
        assert_eq!(ledger.resets().len(), 20);
    }

    #[tokio::test]
    async fn test_panicked_choice_fetch_still_settles() {
        // Arrange
        let source = s1_source();
        source.panic_on_choices(&"A".into());
        let mut session = session(source, Arc::new(RecordingProgressLedger::new()), None);
        session.select_scenario(&select("S1"));
        session.settle().await;

        // Act
        session.begin(&begin()).unwrap();
        let view = tokio::time::timeout(std::time::Duration::from_secs(5), session.settle())
            .await
            .expect("settle must not hang");

        // Assert
        assert_eq!(session.pending(), 0);
        assert_eq!(view.status, Status::InScene);
        assert_eq!(view.choices, None);
        assert_eq!(view.error_detail.unwrap().code, "choice_fetch");
    }
}
