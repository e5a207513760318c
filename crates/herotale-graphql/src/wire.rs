//! Response shapes of the GraphQL backend and their conversion into engine
//! records.

use chrono::{DateTime, NaiveDateTime, Utc};
use herotale_core::error::GatewayError;
use herotale_core::gateway::{
    Ack, AssetRecord, ChoiceRecord, HistoryEntry, MediaRef, ProgressRecord, ScenarioSummary,
    SceneRecord,
};
use herotale_core::identity::User;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ref {
    pub mongo_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MediaDto {
    pub mongo_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScenarioDto {
    pub mongo_id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_published: Option<bool>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SceneDto {
    pub mongo_id: String,
    pub title: Option<String>,
    pub text: Option<String>,
    pub order: Option<i32>,
    pub is_start_scene: Option<bool>,
    pub is_end_scene: Option<bool>,
    pub image_id: Option<MediaDto>,
    pub sound_id: Option<MediaDto>,
    pub music_id: Option<MediaDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChoiceDto {
    pub mongo_id: String,
    pub text: String,
    pub order: Option<i32>,
    pub to_scene_id: Option<Ref>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryDto {
    pub scene_id: Option<Ref>,
    pub choice_id: Option<Ref>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgressDto {
    pub mongo_id: String,
    pub scenario_id: Option<Ref>,
    pub current_scene_id: Option<Ref>,
    pub is_completed: Option<bool>,
    pub progress_percentage: Option<f64>,
    pub total_time_spent: Option<u64>,
    #[serde(default)]
    pub history: Option<Vec<HistoryDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDto {
    pub mongo_id: String,
    pub email: String,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AckDto {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginPayload {
    pub token: Option<String>,
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateUserPayload {
    pub user: Option<UserDto>,
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressPayload {
    pub progress: Option<ProgressDto>,
    pub success: bool,
    pub message: Option<String>,
}

// `data` envelopes, one per operation.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AllScenariosData {
    pub all_scenarios: Option<Vec<ScenarioDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScenarioData {
    pub scenario_by_id: Option<ScenarioDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScenesData {
    pub scenes_by_scenario: Option<Vec<SceneDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChoicesData {
    pub choices_by_scene: Option<Vec<ChoiceDto>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeData {
    pub me: Option<UserDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MyProgressData {
    pub my_progress: Option<Vec<ProgressDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetDto {
    pub mongo_id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MyAssetsData {
    pub my_assets: Option<Vec<AssetDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgressByScenarioData {
    pub progress_by_user_and_scenario: Option<ProgressDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    pub login: LoginPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateUserData {
    pub create_user: CreateUserPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateProgressData {
    pub create_progress: ProgressPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecordProgressData {
    pub record_progress: AckDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateProgressData {
    pub update_progress: AckDto,
}

/// Parses backend timestamps. Offsets are honoured; naive timestamps are
/// taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl From<ScenarioDto> for ScenarioSummary {
    fn from(dto: ScenarioDto) -> Self {
        Self {
            id: dto.mongo_id.into(),
            title: dto.title,
            description: dto.description.unwrap_or_default(),
            is_published: dto.is_published.unwrap_or(false),
            created_at: dto.created_at.as_deref().and_then(parse_timestamp),
        }
    }
}

fn media(dto: Option<MediaDto>) -> Option<MediaRef> {
    let dto = dto?;
    Some(MediaRef {
        id: dto.mongo_id.into(),
        url: dto.url?,
    })
}

impl From<SceneDto> for SceneRecord {
    fn from(dto: SceneDto) -> Self {
        Self {
            id: dto.mongo_id.into(),
            title: dto.title.unwrap_or_default(),
            text: dto.text.unwrap_or_default(),
            order: dto.order,
            is_start_scene: dto.is_start_scene.unwrap_or(false),
            is_end_scene: dto.is_end_scene.unwrap_or(false),
            image: media(dto.image_id),
            narration: media(dto.sound_id),
            music: media(dto.music_id),
        }
    }
}

/// Converts a choice list, dropping choices without a destination.
pub(crate) fn choices(dtos: Vec<ChoiceDto>) -> Vec<ChoiceRecord> {
    dtos.into_iter()
        .filter_map(|dto| {
            let Some(to_scene) = dto.to_scene_id else {
                warn!(choice_id = %dto.mongo_id, "choice has no destination, skipped");
                return None;
            };
            Some(ChoiceRecord {
                id: dto.mongo_id.into(),
                text: dto.text,
                order: dto.order.unwrap_or(0),
                to_scene_id: to_scene.mongo_id.into(),
            })
        })
        .collect()
}

impl TryFrom<ProgressDto> for ProgressRecord {
    type Error = GatewayError;

    fn try_from(dto: ProgressDto) -> Result<Self, Self::Error> {
        let scenario = dto.scenario_id.ok_or_else(|| {
            GatewayError::Decode(format!("progress {} has no scenario", dto.mongo_id))
        })?;
        let history = dto
            .history
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| {
                Some(HistoryEntry {
                    scene_id: entry.scene_id?.mongo_id.into(),
                    choice_id: entry.choice_id.map(|c| c.mongo_id.into()),
                    timestamp: entry.timestamp.as_deref().and_then(parse_timestamp)?,
                })
            })
            .collect();
        Ok(Self {
            id: dto.mongo_id.into(),
            scenario_id: scenario.mongo_id.into(),
            current_scene_id: dto.current_scene_id.map(|r| r.mongo_id.into()),
            is_completed: dto.is_completed.unwrap_or(false),
            progress_percentage: dto.progress_percentage,
            total_time_spent: dto.total_time_spent,
            history,
        })
    }
}

impl From<AssetDto> for AssetRecord {
    fn from(dto: AssetDto) -> Self {
        // JSONString fields arrive as encoded text.
        let metadata = match dto.metadata {
            Some(serde_json::Value::String(raw)) => {
                serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
            }
            Some(value) => value,
            None => serde_json::Value::Null,
        };
        Self {
            id: dto.mongo_id.into(),
            name: dto.name.unwrap_or_default(),
            kind: dto.kind.unwrap_or_default(),
            url: dto.url,
            metadata,
        }
    }
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.mongo_id.into(),
            email: dto.email,
            role: dto.role.unwrap_or_else(|| "player".to_owned()),
            first_name: dto.first_name,
            last_name: dto.last_name,
        }
    }
}

impl From<AckDto> for Ack {
    fn from(dto: AckDto) -> Self {
        Self {
            success: dto.success,
            message: dto.message.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use herotale_core::ids::SceneId;
    use serde_json::json;

    #[test]
    fn test_scene_media_references_are_projected() {
        // Arrange
        let dto: SceneDto = serde_json::from_value(json!({
            "mongoId": "A",
            "title": "Gate",
            "text": "A gate.",
            "order": 1,
            "isStartScene": true,
            "isEndScene": false,
            "imageId": { "mongoId": "img-1", "url": "/media/assets/gate.png" },
            "soundId": null,
            "musicId": { "mongoId": "mus-1", "url": null }
        }))
        .unwrap();

        // Act
        let record = SceneRecord::from(dto);

        // Assert
        assert!(record.is_start_scene);
        assert_eq!(record.image.unwrap().url, "/media/assets/gate.png");
        assert!(record.narration.is_none());
        assert!(record.music.is_none(), "media without url is dropped");
    }

    #[test]
    fn test_choice_without_destination_is_skipped() {
        let dtos: Vec<ChoiceDto> = serde_json::from_value(json!([
            { "mongoId": "c1", "text": "go", "order": 2, "toSceneId": { "mongoId": "B" } },
            { "mongoId": "c2", "text": "nowhere", "order": 1, "toSceneId": null }
        ]))
        .unwrap();

        let records = choices(dtos);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].to_scene_id, SceneId::from("B"));
    }

    #[test]
    fn test_naive_timestamp_is_read_as_utc() {
        assert_eq!(
            parse_timestamp("2026-01-15T10:00:00.250000"),
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
                .single()
                .map(|t| t + chrono::Duration::milliseconds(250))
        );
        assert_eq!(
            parse_timestamp("2026-01-15T11:00:00+01:00"),
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).single()
        );
    }

    #[test]
    fn test_progress_without_scenario_fails_to_decode() {
        let dto: ProgressDto = serde_json::from_value(json!({
            "mongoId": "p-1",
            "currentSceneId": { "mongoId": "A" }
        }))
        .unwrap();

        assert!(matches!(
            ProgressRecord::try_from(dto),
            Err(GatewayError::Decode(_))
        ));
    }

    #[test]
    fn test_asset_metadata_encoded_as_text_is_decoded() {
        let dto: AssetDto = serde_json::from_value(json!({
            "mongoId": "lamp",
            "name": "Brass lamp",
            "type": "item",
            "url": "/media/assets/lamp.png",
            "metadata": "{\"description\": \"Lights the way\"}"
        }))
        .unwrap();

        let record = AssetRecord::from(dto);

        assert_eq!(record.kind, "item");
        assert_eq!(record.metadata["description"], "Lights the way");
    }

    #[test]
    fn test_asset_with_plain_metadata_keeps_it() {
        let dto: AssetDto = serde_json::from_value(json!({
            "mongoId": "orb",
            "name": "Glass orb",
            "type": "item",
            "url": null,
            "metadata": { "weight": 2 }
        }))
        .unwrap();

        let record = AssetRecord::from(dto);

        assert_eq!(record.url, None);
        assert_eq!(record.metadata["weight"], 2);
    }
}
