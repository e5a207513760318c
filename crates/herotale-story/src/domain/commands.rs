//! Player actions for the story progression context.

use herotale_core::command::Command;
use herotale_core::ids::{ChoiceId, ScenarioId};
use uuid::Uuid;

/// Action to load a scenario, discarding any current one.
#[derive(Debug, Clone)]
pub struct SelectScenario {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The scenario to play.
    pub scenario_id: ScenarioId,
}

impl Command for SelectScenario {
    fn command_type(&self) -> &'static str {
        "story.select_scenario"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Action to enter the start scene.
#[derive(Debug, Clone)]
pub struct BeginStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for BeginStory {
    fn command_type(&self) -> &'static str {
        "story.begin"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Action to take one of the current scene's choices.
#[derive(Debug, Clone)]
pub struct MakeChoice {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The choice taken.
    pub choice_id: ChoiceId,
}

impl Command for MakeChoice {
    fn command_type(&self) -> &'static str {
        "story.make_choice"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Action to return to the start of the loaded scenario.
#[derive(Debug, Clone)]
pub struct RestartStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for RestartStory {
    fn command_type(&self) -> &'static str {
        "story.restart"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Action to fetch the current scene's choices again after a failure.
#[derive(Debug, Clone)]
pub struct RetryChoices {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for RetryChoices {
    fn command_type(&self) -> &'static str {
        "story.retry_choices"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
