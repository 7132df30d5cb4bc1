use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::dao::models::{CorrectAnswer, GameEntity, QuestionEntity, QuestionType, UserEntity};

fn epoch() -> DateTime {
    DateTime::from_millis(0)
}

/// BSON projection of a [`GameEntity`].
///
/// Field names match the historical document layout (`_id`, `gamePin`,
/// `publishStatus`, ...) so existing collections stay readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub publish_status: bool,
    // Shell documents written by pin assignment carry only `_id`, `gamePin`,
    // and `updatedAt`; everything else must default on read.
    #[serde(default = "epoch")]
    pub start_date: DateTime,
    #[serde(default = "epoch")]
    pub end_date: DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_pin: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDocument>,
    #[serde(default)]
    pub users: Vec<UserDocument>,
    #[serde(default = "epoch")]
    pub created_at: DateTime,
    #[serde(default = "epoch")]
    pub updated_at: DateTime,
    #[serde(default)]
    pub revision: i64,
}

/// BSON projection of a [`QuestionEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDocument {
    pub question_id: String,
    pub question_type: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: CorrectAnswer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// BSON projection of a [`UserEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub added_at: DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl From<GameEntity> for GameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            tags: value.tags,
            publish_status: value.publish_status,
            start_date: DateTime::from_system_time(value.start_date),
            end_date: DateTime::from_system_time(value.end_date),
            game_pin: value.game_pin,
            questions: value.questions.into_iter().map(Into::into).collect(),
            users: value.users.into_iter().map(Into::into).collect(),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            revision: value.revision as i64,
        }
    }
}

impl From<GameDocument> for GameEntity {
    fn from(value: GameDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            tags: value.tags,
            publish_status: value.publish_status,
            start_date: value.start_date.to_system_time(),
            end_date: value.end_date.to_system_time(),
            game_pin: value.game_pin,
            questions: value.questions.into_iter().map(Into::into).collect(),
            users: value.users.into_iter().map(Into::into).collect(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            revision: value.revision.max(0) as u64,
        }
    }
}

impl From<QuestionEntity> for QuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            question_id: value.question_id,
            question_type: value.question_type.into(),
            question_text: value.question_text,
            options: value.options,
            correct_answer: value.correct_answer,
            time_limit: value.time_limit,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<QuestionDocument> for QuestionEntity {
    fn from(value: QuestionDocument) -> Self {
        Self {
            question_id: value.question_id,
            question_type: QuestionType::from(value.question_type),
            question_text: value.question_text,
            options: value.options,
            correct_answer: value.correct_answer,
            time_limit: value.time_limit,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

impl From<UserEntity> for UserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            user_name: value.user_name,
            score: value.score,
            rank: value.rank,
            avatar: value.avatar,
            added_at: DateTime::from_system_time(value.added_at),
            updated_at: value.updated_at.map(DateTime::from_system_time),
        }
    }
}

impl From<UserDocument> for UserEntity {
    fn from(value: UserDocument) -> Self {
        Self {
            user_name: value.user_name,
            score: value.score,
            rank: value.rank,
            avatar: value.avatar,
            added_at: value.added_at.to_system_time(),
            updated_at: value.updated_at.map(|stamp| stamp.to_system_time()),
        }
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{deserialize_from_document, doc};

    use super::*;

    #[test]
    fn legacy_pin_shell_document_deserializes() {
        let document = doc! {
            "_id": "game_legacy",
            "gamePin": "654321",
            "updatedAt": DateTime::from_millis(1_700_000_000_000),
        };

        let parsed: GameDocument = deserialize_from_document(document).unwrap();
        assert_eq!(parsed.id, "game_legacy");
        assert_eq!(parsed.game_pin.as_deref(), Some("654321"));
        assert!(parsed.title.is_empty());
        assert!(parsed.questions.is_empty());
        assert_eq!(parsed.revision, 0);
        assert_eq!(parsed.start_date, epoch());
        assert_eq!(parsed.created_at, epoch());
        assert_eq!(
            parsed.updated_at,
            DateTime::from_millis(1_700_000_000_000)
        );
    }

    #[test]
    fn full_document_round_trips_through_the_entity() {
        let entity = GameEntity::shell("game_rt".to_owned(), std::time::SystemTime::now());
        let document: GameDocument = entity.clone().into();
        let back: GameEntity = document.into();
        assert_eq!(back.id, entity.id);
        assert_eq!(back.revision, entity.revision);
    }
}
