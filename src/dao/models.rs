use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminator for how a question expects its answers to be chosen.
///
/// Anything other than the two well-known tags is preserved verbatim so
/// unusual question kinds survive a round trip through storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    /// Exactly one correct answer.
    SingleChoice,
    /// One or more correct answers.
    MultipleChoice,
    /// Free-form tag the backend does not interpret.
    Other(String),
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "single-choice" => QuestionType::SingleChoice,
            "multiple-choice" => QuestionType::MultipleChoice,
            _ => QuestionType::Other(value),
        }
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        match value {
            QuestionType::SingleChoice => "single-choice".to_owned(),
            QuestionType::MultipleChoice => "multiple-choice".to_owned(),
            QuestionType::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::SingleChoice => f.write_str("single-choice"),
            QuestionType::MultipleChoice => f.write_str("multiple-choice"),
            QuestionType::Other(tag) => f.write_str(tag),
        }
    }
}

/// Canonical encoding of a question's correct answer(s).
///
/// Historically three shapes reached the backend: an index into `options`, a
/// literal option value, and a plural list of indices. They are unified here
/// as one untagged union; the plural legacy field is adapted into
/// [`CorrectAnswer::IndexSet`] before it ever reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    /// Zero-based index into the option list.
    Index(usize),
    /// Set of distinct zero-based indices into the option list.
    IndexSet(Vec<usize>),
    /// Literal value equal to one of the options.
    Value(String),
    /// Set of literal values, each equal to one of the options.
    ValueSet(Vec<String>),
}

/// A single quiz question embedded in a game document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEntity {
    /// Merge key, unique within a game.
    pub question_id: String,
    /// Declared answering mode.
    pub question_type: QuestionType,
    /// Prompt shown to participants.
    pub question_text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Validated canonical answer encoding.
    pub correct_answer: CorrectAnswer,
    /// Optional per-question time limit in seconds (strictly positive).
    pub time_limit: Option<u32>,
    /// First time this question was stored.
    pub created_at: SystemTime,
    /// Last time this question was merged over.
    pub updated_at: SystemTime,
}

/// A participant entry embedded in a game document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntity {
    /// Merge key, unique within a game's user list.
    pub user_name: String,
    /// Accumulated score, if any.
    pub score: Option<u32>,
    /// Leaderboard rank (1-based), if any.
    pub rank: Option<u32>,
    /// Avatar reference, never blank when present.
    pub avatar: Option<String>,
    /// When the user first joined the game.
    pub added_at: SystemTime,
    /// Set the first time the entry is merged over, absent for fresh joins.
    pub updated_at: Option<SystemTime>,
}

/// Aggregate game document persisted by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntity {
    /// Primary key, caller supplied or generated via [`generate_game_id`].
    pub id: String,
    /// Display title, unique across the collection.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Tag set with blank entries filtered out.
    pub tags: Vec<String>,
    /// Whether the game is published.
    pub publish_status: bool,
    /// Scheduled start, strictly before `end_date`.
    pub start_date: SystemTime,
    /// Scheduled end.
    pub end_date: SystemTime,
    /// Human-enterable six-digit join code, assigned at most once.
    pub game_pin: Option<String>,
    /// Embedded question list, keyed by `question_id`.
    pub questions: Vec<QuestionEntity>,
    /// Embedded participant list, keyed by `user_name`.
    pub users: Vec<UserEntity>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
    /// Optimistic concurrency counter, bumped on every guarded write.
    pub revision: u64,
}

impl GameEntity {
    /// Build an empty game shell used when an upsert targets an id that does
    /// not exist yet (question merges and pin assignment both allow this).
    pub fn shell(id: String, now: SystemTime) -> Self {
        Self {
            id,
            title: String::new(),
            description: String::new(),
            tags: Vec::new(),
            publish_status: false,
            start_date: now,
            end_date: now,
            game_pin: None,
            questions: Vec::new(),
            users: Vec::new(),
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }
}

/// Generate a fresh game identifier.
///
/// UUIDv7 keeps ids time-ordered like the historical
/// `game_<timestamp><suffix>` format while being collision resistant.
pub fn generate_game_id() -> String {
    format!("game_{}", Uuid::now_v7().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_round_trips_known_tags() {
        assert_eq!(
            QuestionType::from("single-choice".to_owned()),
            QuestionType::SingleChoice
        );
        assert_eq!(
            QuestionType::from("multiple-choice".to_owned()),
            QuestionType::MultipleChoice
        );
        assert_eq!(String::from(QuestionType::SingleChoice), "single-choice");
    }

    #[test]
    fn question_type_preserves_unknown_tags() {
        let tag = QuestionType::from("open-text".to_owned());
        assert_eq!(tag, QuestionType::Other("open-text".to_owned()));
        assert_eq!(String::from(tag), "open-text");
    }

    #[test]
    fn correct_answer_deserializes_all_shapes() {
        let index: CorrectAnswer = serde_json::from_str("2").unwrap();
        assert_eq!(index, CorrectAnswer::Index(2));

        let set: CorrectAnswer = serde_json::from_str("[0, 2]").unwrap();
        assert_eq!(set, CorrectAnswer::IndexSet(vec![0, 2]));

        let value: CorrectAnswer = serde_json::from_str("\"Paris\"").unwrap();
        assert_eq!(value, CorrectAnswer::Value("Paris".to_owned()));

        let values: CorrectAnswer = serde_json::from_str("[\"a\", \"b\"]").unwrap();
        assert_eq!(
            values,
            CorrectAnswer::ValueSet(vec!["a".to_owned(), "b".to_owned()])
        );
    }

    #[test]
    fn generated_game_ids_are_unique_and_prefixed() {
        let first = generate_game_id();
        let second = generate_game_id();
        assert!(first.starts_with("game_"));
        assert_ne!(first, second);
    }
}
