use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::GameEntity,
    dto::{
        format_system_time, question::QuestionDto, question::QuestionInput, user::UserDto,
        validation::not_blank,
    },
};

/// Tags arrive either as an array or, from older clients, a lone string.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TagsInput {
    /// Regular tag array.
    Many(Vec<String>),
    /// Single tag sent as a bare string.
    One(String),
}

impl TagsInput {
    /// Normalize into a tag list with blank entries filtered out.
    pub fn into_tags(self) -> Vec<String> {
        let raw = match self {
            TagsInput::Many(tags) => tags,
            TagsInput::One(tag) => vec![tag],
        };
        raw.into_iter()
            .map(|tag| tag.trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Publish status arrives as a JSON bool or the strings `"true"`/`"false"`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PublishStatusInput {
    /// Proper boolean flag.
    Flag(bool),
    /// String-encoded flag from legacy clients.
    Text(String),
}

impl PublishStatusInput {
    /// Coerce to a boolean; anything other than `true`/`"true"` is false.
    pub fn as_bool(&self) -> bool {
        match self {
            PublishStatusInput::Flag(value) => *value,
            PublishStatusInput::Text(value) => value == "true",
        }
    }
}

/// Body of `POST /games`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Caller-supplied id; generated when omitted.
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    /// Display title, unique across the collection.
    #[validate(custom(function = not_blank))]
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Optional tag set (array or lone string).
    #[serde(default)]
    pub tags: Option<TagsInput>,
    /// Publish flag, defaults to unpublished.
    #[serde(default)]
    pub publish_status: Option<PublishStatusInput>,
    /// Scheduled start (RFC 3339 or `YYYY-MM-DD`), strictly before `endDate`.
    pub start_date: String,
    /// Scheduled end.
    pub end_date: String,
    /// Optional initial question list.
    #[serde(default)]
    #[validate(nested)]
    pub questions: Option<Vec<QuestionInput>>,
}

/// Body of `PUT /games/{id}`; only supplied fields are touched.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGameRequest {
    /// Replacement title.
    #[serde(default)]
    #[validate(custom(function = not_blank))]
    pub title: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement tag set.
    #[serde(default)]
    pub tags: Option<TagsInput>,
    /// Replacement publish flag.
    #[serde(default)]
    pub publish_status: Option<PublishStatusInput>,
    /// New start date, validated against the effective end date.
    #[serde(default)]
    pub start_date: Option<String>,
    /// New end date, validated against the effective start date.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Questions to merge into the stored list.
    #[serde(default)]
    #[validate(nested)]
    pub questions: Option<Vec<QuestionInput>>,
}

/// Full projection of a stored game.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub publish_status: bool,
    pub start_date: String,
    pub end_date: String,
    pub game_pin: Option<String>,
    pub questions: Vec<QuestionDto>,
    pub users: Vec<UserDto>,
    pub created_at: String,
    pub updated_at: String,
    pub revision: u64,
}

impl From<GameEntity> for GameDto {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            tags: entity.tags,
            publish_status: entity.publish_status,
            start_date: format_system_time(entity.start_date),
            end_date: format_system_time(entity.end_date),
            game_pin: entity.game_pin,
            questions: entity.questions.into_iter().map(Into::into).collect(),
            users: entity.users.into_iter().map(Into::into).collect(),
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
            revision: entity.revision,
        }
    }
}

/// Response of `POST /games`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "_id")]
    pub id: String,
    pub game: GameDto,
}

/// Response of `GET /games`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListGamesResponse {
    pub success: bool,
    pub games: Vec<GameDto>,
    pub count: usize,
}

/// Response of `GET /games/{id}`; `game` is absent on the 404 body.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct GetGameResponse {
    pub success: bool,
    pub game: Option<GameDto>,
    pub message: Option<String>,
}

/// Response of `PUT /games/{id}`; merge stats appear only when questions
/// were part of the update.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGameResponse {
    pub success: bool,
    pub message: String,
    pub game: GameDto,
    pub total_questions: Option<usize>,
    pub added_questions: Option<Vec<String>>,
    pub updated_questions: Option<Vec<String>>,
}

/// Response of `POST /games/{id}/pin`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PinResponse {
    /// The game's six-digit join code.
    pub gamepin: String,
    #[serde(rename = "_id")]
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_accept_array_and_lone_string() {
        let many: TagsInput = serde_json::from_value(serde_json::json!(["a", " ", "b "])).unwrap();
        assert_eq!(many.into_tags(), vec!["a".to_owned(), "b".to_owned()]);

        let one: TagsInput = serde_json::from_value(serde_json::json!("trivia")).unwrap();
        assert_eq!(one.into_tags(), vec!["trivia".to_owned()]);
    }

    #[test]
    fn publish_status_coerces_bools_and_strings() {
        let flag: PublishStatusInput = serde_json::from_value(serde_json::json!(true)).unwrap();
        assert!(flag.as_bool());

        let text: PublishStatusInput = serde_json::from_value(serde_json::json!("true")).unwrap();
        assert!(text.as_bool());

        let other: PublishStatusInput = serde_json::from_value(serde_json::json!("yes")).unwrap();
        assert!(!other.as_bool());
    }

    #[test]
    fn create_request_reads_camel_case_and_underscore_id() {
        let request: CreateGameRequest = serde_json::from_value(serde_json::json!({
            "_id": "game_1",
            "title": "Quiz night",
            "description": "Friday fun",
            "publishStatus": "true",
            "startDate": "2024-01-01",
            "endDate": "2024-01-10"
        }))
        .unwrap();

        assert_eq!(request.id.as_deref(), Some("game_1"));
        assert!(request.publish_status.unwrap().as_bool());
    }
}
