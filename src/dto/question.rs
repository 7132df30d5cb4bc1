use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{CorrectAnswer, QuestionEntity},
    dto::{format_system_time, validation::not_blank},
};

/// Incoming question record, either at game creation or through a merge.
///
/// `correct_answer` accepts an option index, a literal option value, or a
/// set of either; the legacy plural `correct_answers` index list is also
/// accepted and normalized. Exactly one of the two fields must be present.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    /// Merge key, unique within a game.
    #[validate(custom(function = not_blank))]
    pub question_id: String,
    /// Declared answering mode (`single-choice`, `multiple-choice`, or any tag).
    #[validate(custom(function = not_blank))]
    pub question_type: String,
    /// Prompt shown to participants.
    #[validate(custom(function = not_blank))]
    pub question_text: String,
    /// Ordered answer options.
    #[validate(length(min = 1, message = "at least one option is required"))]
    pub options: Vec<String>,
    /// Canonical answer encoding.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub correct_answer: Option<CorrectAnswer>,
    /// Legacy plural index-list encoding.
    #[serde(default)]
    pub correct_answers: Option<Vec<usize>>,
    /// Optional time limit in seconds, strictly positive.
    #[serde(default)]
    #[validate(range(min = 1, message = "time limit must be a positive number of seconds"))]
    pub time_limit: Option<u32>,
}

/// Body of `POST /games/{id}/questions`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MergeQuestionsRequest {
    /// Questions to merge into the game, keyed by `questionId`.
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

/// Projection of a stored question returned inside game payloads.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub question_id: String,
    pub question_type: String,
    pub question_text: String,
    pub options: Vec<String>,
    #[schema(value_type = Object)]
    pub correct_answer: CorrectAnswer,
    pub time_limit: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<QuestionEntity> for QuestionDto {
    fn from(entity: QuestionEntity) -> Self {
        Self {
            question_id: entity.question_id,
            question_type: entity.question_type.into(),
            question_text: entity.question_text,
            options: entity.options,
            correct_answer: entity.correct_answer,
            time_limit: entity.time_limit,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Response of `POST /games/{id}/questions`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeQuestionsResponse {
    pub success: bool,
    pub game_id: String,
    /// Size of the merged question list.
    pub total_questions: usize,
    /// Keys appended by this merge.
    pub added_questions: Vec<String>,
    /// Keys replaced in place by this merge.
    pub updated_questions: Vec<String>,
    pub added_count: usize,
    pub updated_count: usize,
    /// Whether the parent game document was `created` or `updated`.
    pub operation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_question() -> serde_json::Value {
        serde_json::json!({
            "questionId": "q1",
            "questionType": "single-choice",
            "questionText": "Capital of France?",
            "options": ["Paris", "Lyon"],
            "correctAnswer": 0
        })
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let input: QuestionInput = serde_json::from_value(base_question()).unwrap();
        assert_eq!(input.question_id, "q1");
        assert_eq!(input.correct_answer, Some(CorrectAnswer::Index(0)));
        assert!(input.correct_answers.is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn legacy_plural_field_deserializes_separately() {
        let mut raw = base_question();
        raw["correctAnswer"] = serde_json::Value::Null;
        raw["correctAnswers"] = serde_json::json!([0, 1]);
        let input: QuestionInput = serde_json::from_value(raw).unwrap();
        assert!(input.correct_answer.is_none());
        assert_eq!(input.correct_answers, Some(vec![0, 1]));
    }

    #[test]
    fn blank_prompt_or_empty_options_fail_validation() {
        let mut raw = base_question();
        raw["questionText"] = serde_json::json!("   ");
        let input: QuestionInput = serde_json::from_value(raw).unwrap();
        assert!(input.validate().is_err());

        let mut raw = base_question();
        raw["options"] = serde_json::json!([]);
        let input: QuestionInput = serde_json::from_value(raw).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn zero_time_limit_fails_validation() {
        let mut raw = base_question();
        raw["timeLimit"] = serde_json::json!(0);
        let input: QuestionInput = serde_json::from_value(raw).unwrap();
        assert!(input.validate().is_err());
    }
}
