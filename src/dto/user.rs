use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::UserEntity,
    dto::{format_system_time, game::GameDto, validation::not_blank},
};

/// Incoming participant record.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    /// Merge key, unique within the game's user list.
    #[validate(custom(function = not_blank))]
    pub user_name: String,
    /// Non-negative score.
    #[serde(default)]
    pub score: Option<u32>,
    /// Leaderboard rank, 1-based.
    #[serde(default)]
    #[validate(range(min = 1, message = "rank must be a positive number"))]
    pub rank: Option<u32>,
    /// Avatar reference; blank strings are rejected.
    #[serde(default)]
    #[validate(custom(function = not_blank))]
    pub avatar: Option<String>,
}

/// Body of `POST /games/{id}/users`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddUserRequest {
    /// The participant to add or update.
    #[validate(nested)]
    pub user: UserInput,
}

/// Projection of a stored participant returned inside game payloads.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub user_name: String,
    pub score: Option<u32>,
    pub rank: Option<u32>,
    pub avatar: Option<String>,
    pub added_at: String,
    pub updated_at: Option<String>,
}

impl From<UserEntity> for UserDto {
    fn from(entity: UserEntity) -> Self {
        Self {
            user_name: entity.user_name,
            score: entity.score,
            rank: entity.rank,
            avatar: entity.avatar,
            added_at: format_system_time(entity.added_at),
            updated_at: entity.updated_at.map(format_system_time),
        }
    }
}

/// Response of `POST /games/{id}/users`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddUserResponse {
    pub success: bool,
    pub message: String,
    /// Size of the merged user list.
    pub total_users: usize,
    pub is_new_user: bool,
    pub is_updated: bool,
    pub game: GameDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_name_is_required_and_non_blank() {
        let input: UserInput =
            serde_json::from_value(serde_json::json!({"userName": "  "})).unwrap();
        assert!(input.validate().is_err());

        let input: UserInput =
            serde_json::from_value(serde_json::json!({"userName": "alice"})).unwrap();
        assert!(input.validate().is_ok());
    }

    #[test]
    fn rank_zero_and_blank_avatar_are_rejected() {
        let input: UserInput =
            serde_json::from_value(serde_json::json!({"userName": "alice", "rank": 0})).unwrap();
        assert!(input.validate().is_err());

        let input: UserInput =
            serde_json::from_value(serde_json::json!({"userName": "alice", "avatar": ""}))
                .unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn negative_score_is_a_type_error() {
        let result: Result<UserInput, _> =
            serde_json::from_value(serde_json::json!({"userName": "alice", "score": -5}));
        assert!(result.is_err());
    }
}
