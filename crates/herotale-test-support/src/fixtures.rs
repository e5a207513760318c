//! Canned backend records.
//!
//! `s1()` is the reference scenario used across the test suites:
//!
//! ```text
//! A (start) --"go north" (order 1)--> B (no choices, not an ending)
//!           --"go south" (order 0)--> C (ending)
//! ```

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use herotale_core::gateway::{
    AssetRecord, ChoiceRecord, MediaRef, ProgressRecord, ScenarioSummary, SceneRecord,
};
use herotale_core::identity::{AuthToken, Principal, User};
use herotale_core::ids::{AssetId, SceneId};

/// A scenario as an in-memory backend would hold it.
#[derive(Debug, Clone)]
pub struct ScenarioFixture {
    pub summary: ScenarioSummary,
    pub scenes: Vec<SceneRecord>,
    /// Outbound choices per scene, in backend order.
    pub choices: HashMap<SceneId, Vec<ChoiceRecord>>,
}

/// Published scenario metadata titled "Scenario {id}".
#[must_use]
pub fn summary(id: &str) -> ScenarioSummary {
    ScenarioSummary {
        id: id.into(),
        title: format!("Scenario {id}"),
        description: format!("Test scenario {id}"),
        is_published: true,
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single(),
    }
}

/// A scene with an image at `/media/assets/{id}.png`.
#[must_use]
pub fn scene(id: &str, is_start: bool, is_end: bool) -> SceneRecord {
    SceneRecord {
        id: id.into(),
        title: format!("Scene {id}"),
        text: format!("You are in scene {id}."),
        order: None,
        is_start_scene: is_start,
        is_end_scene: is_end,
        image: Some(MediaRef {
            id: AssetId::from(format!("img-{id}")),
            url: format!("/media/assets/{id}.png"),
        }),
        narration: None,
        music: None,
    }
}

#[must_use]
pub fn choice(id: &str, text: &str, order: i32, to: &str) -> ChoiceRecord {
    ChoiceRecord {
        id: id.into(),
        text: text.to_owned(),
        order,
        to_scene_id: to.into(),
    }
}

/// The reference scenario, see the module docs.
#[must_use]
pub fn s1() -> ScenarioFixture {
    let mut choices = HashMap::new();
    choices.insert(
        SceneId::from("A"),
        vec![
            choice("north", "go north", 1, "B"),
            choice("south", "go south", 0, "C"),
        ],
    );
    choices.insert(SceneId::from("B"), Vec::new());
    ScenarioFixture {
        summary: summary("S1"),
        scenes: vec![
            scene("A", true, false),
            scene("B", false, false),
            scene("C", false, true),
        ],
        choices,
    }
}

/// Two scenes, `{id}-start` leading to the ending `{id}-end`.
#[must_use]
pub fn two_step(id: &str) -> ScenarioFixture {
    let start = format!("{id}-start");
    let end = format!("{id}-end");
    let mut choices = HashMap::new();
    choices.insert(
        SceneId::from(start.as_str()),
        vec![choice(&format!("{id}-onward"), "onward", 0, &end)],
    );
    ScenarioFixture {
        summary: summary(id),
        scenes: vec![scene(&start, true, false), scene(&end, false, true)],
        choices,
    }
}

/// The player account `hero@example.org`.
#[must_use]
pub fn user() -> User {
    User {
        id: "u-1".into(),
        email: "hero@example.org".to_owned(),
        role: "player".to_owned(),
        first_name: Some("Hero".to_owned()),
        last_name: None,
    }
}

/// [`user`] signed in with token `tok-1`.
#[must_use]
pub fn principal() -> Principal {
    Principal {
        user: user(),
        token: AuthToken::new("tok-1"),
    }
}

/// An open progress record positioned at `scene`.
#[must_use]
pub fn progress(id: &str, scenario: &str, scene: &str) -> ProgressRecord {
    ProgressRecord {
        id: id.into(),
        scenario_id: scenario.into(),
        current_scene_id: Some(scene.into()),
        is_completed: false,
        progress_percentage: None,
        total_time_spent: None,
        history: Vec::new(),
    }
}

/// An inventory item with a description in its metadata and an icon at
/// `/media/assets/{id}.png`.
#[must_use]
pub fn asset(id: &str, name: &str, description: &str) -> AssetRecord {
    AssetRecord {
        id: id.into(),
        name: name.to_owned(),
        kind: "item".to_owned(),
        url: Some(format!("/media/assets/{id}.png")),
        metadata: serde_json::json!({ "description": description }),
    }
}
