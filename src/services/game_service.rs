//! Game CRUD and list-merge orchestration.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::{
        game_store::GameStore,
        models::{GameEntity, QuestionEntity, QuestionType, UserEntity, generate_game_id},
    },
    dto::{
        game::{CreateGameRequest, UpdateGameRequest},
        parse_date,
        question::QuestionInput,
        user::UserInput,
    },
    error::ServiceError,
    services::{
        answer_schema::{resolve_encoding, validate_answer},
        merge::merge_by_key,
    },
    state::SharedState,
};

/// Whether a game-level upsert created the parent document or updated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameWriteOperation {
    /// The game document did not exist and was created by this write.
    Created,
    /// An existing game document was updated.
    Updated,
}

impl GameWriteOperation {
    /// Wire representation used in responses.
    pub fn as_str(self) -> &'static str {
        match self {
            GameWriteOperation::Created => "created",
            GameWriteOperation::Updated => "updated",
        }
    }
}

/// Outcome of a question merge, reported back to the caller.
#[derive(Debug)]
pub struct QuestionMergeReport {
    /// The game as written.
    pub game: GameEntity,
    /// Question ids appended by the merge.
    pub added: Vec<String>,
    /// Question ids replaced in place by the merge.
    pub updated: Vec<String>,
    /// Whether the parent document was created or updated.
    pub operation: GameWriteOperation,
}

/// Outcome of a user merge.
#[derive(Debug)]
pub struct UserMergeReport {
    /// The game as written.
    pub game: GameEntity,
    /// True when the user was appended rather than updated in place.
    pub is_new_user: bool,
}

/// Question merge statistics attached to an update response.
#[derive(Debug)]
pub struct QuestionMergeStats {
    pub added: Vec<String>,
    pub updated: Vec<String>,
}

/// Outcome of a partial game update.
#[derive(Debug)]
pub struct GameUpdateReport {
    /// The game as written.
    pub game: GameEntity,
    /// Present only when the update carried questions.
    pub merge: Option<QuestionMergeStats>,
}

/// Create a new game document.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameEntity, ServiceError> {
    let store = state.require_game_store().await?;

    let id = request
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(generate_game_id);

    if store.find_game(id.clone()).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "game with id `{id}` already exists"
        )));
    }
    if store
        .find_game_by_title(request.title.clone())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "game with title `{}` already exists",
            request.title
        )));
    }

    let start_date = parse_date_field(&request.start_date, "startDate")?;
    let end_date = parse_date_field(&request.end_date, "endDate")?;
    ensure_date_order(start_date, end_date)?;

    let now = SystemTime::now();
    let questions = match request.questions {
        Some(inputs) => {
            let entities = build_questions(inputs, now)?;
            // Collapse duplicate ids inside the initial batch, last one wins.
            merge_by_key(&[], entities).merged
        }
        None => Vec::new(),
    };

    let game = GameEntity {
        id: id.clone(),
        title: request.title,
        description: request.description,
        tags: request.tags.map(|tags| tags.into_tags()).unwrap_or_default(),
        publish_status: request
            .publish_status
            .map(|status| status.as_bool())
            .unwrap_or(false),
        start_date,
        end_date,
        game_pin: None,
        questions,
        users: Vec::new(),
        created_at: now,
        updated_at: now,
        revision: 0,
    };

    store.insert_game(game.clone()).await?;
    info!(game_id = %id, "created game");
    Ok(game)
}

/// Fetch every stored game.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameEntity>, ServiceError> {
    let store = state.require_game_store().await?;
    Ok(store.list_games().await?)
}

/// Fetch one game by id, if present.
pub async fn get_game(state: &SharedState, id: &str) -> Result<Option<GameEntity>, ServiceError> {
    let store = state.require_game_store().await?;
    Ok(store.find_game(id.to_owned()).await?)
}

/// Merge a batch of questions into a game, creating the game shell when the
/// id does not exist yet (game-level upsert).
pub async fn merge_questions(
    state: &SharedState,
    id: &str,
    inputs: Vec<QuestionInput>,
) -> Result<QuestionMergeReport, ServiceError> {
    if id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("game id is required".into()));
    }
    if inputs.is_empty() {
        return Err(ServiceError::InvalidInput(
            "questions array must not be empty".into(),
        ));
    }

    let store = state.require_game_store().await?;
    let now = SystemTime::now();
    let incoming = build_questions(inputs, now)?;

    match store.find_game(id.to_owned()).await? {
        Some(game) => {
            let incoming = incoming.clone();
            let (game, outcome) =
                apply_guarded(&store, state.config().write_retries, game, move |mut game| {
                    let outcome = merge_by_key(&game.questions, incoming.clone());
                    game.questions = outcome.merged.clone();
                    Ok((game, outcome))
                })
                .await?;

            info!(
                game_id = %id,
                added = outcome.added.len(),
                updated = outcome.updated.len(),
                "merged questions into existing game"
            );
            Ok(QuestionMergeReport {
                game,
                added: outcome.added,
                updated: outcome.updated,
                operation: GameWriteOperation::Updated,
            })
        }
        None => {
            let mut shell = GameEntity::shell(id.to_owned(), now);
            let outcome = merge_by_key(&shell.questions, incoming);
            shell.questions = outcome.merged;
            store.save_game(shell.clone()).await?;

            info!(game_id = %id, added = outcome.added.len(), "created game from question merge");
            Ok(QuestionMergeReport {
                game: shell,
                added: outcome.added,
                updated: outcome.updated,
                operation: GameWriteOperation::Created,
            })
        }
    }
}

/// Add a participant to a game or update the matching entry in place.
pub async fn add_user(
    state: &SharedState,
    id: &str,
    input: UserInput,
) -> Result<UserMergeReport, ServiceError> {
    if id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("game id is required".into()));
    }

    let store = state.require_game_store().await?;
    let game = store
        .find_game(id.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` does not exist")))?;

    let incoming = UserEntity {
        user_name: input.user_name,
        score: input.score,
        rank: input.rank,
        avatar: input.avatar,
        added_at: SystemTime::UNIX_EPOCH,
        updated_at: None,
    };

    let (game, is_new_user) =
        apply_guarded(&store, state.config().write_retries, game, move |mut game| {
            let outcome = merge_by_key(&game.users, vec![incoming.clone()]);
            let is_new = !outcome.added.is_empty();
            game.users = outcome.merged;
            Ok((game, is_new))
        })
        .await?;

    info!(game_id = %id, is_new_user, "merged user into game");
    Ok(UserMergeReport { game, is_new_user })
}

/// Apply a partial update to an existing game.
pub async fn update_game(
    state: &SharedState,
    id: &str,
    request: UpdateGameRequest,
) -> Result<GameUpdateReport, ServiceError> {
    if id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("game id is required".into()));
    }

    let store = state.require_game_store().await?;
    let game = store
        .find_game(id.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` does not exist")))?;

    let new_start = request
        .start_date
        .as_deref()
        .map(|value| parse_date_field(value, "startDate"))
        .transpose()?;
    let new_end = request
        .end_date
        .as_deref()
        .map(|value| parse_date_field(value, "endDate"))
        .transpose()?;

    let now = SystemTime::now();
    let incoming_questions = request
        .questions
        .map(|inputs| build_questions(inputs, now))
        .transpose()?;

    let title = request.title;
    let description = request.description;
    let tags = request.tags.map(|tags| tags.into_tags());
    let publish_status = request.publish_status.map(|status| status.as_bool());

    let (game, merge) =
        apply_guarded(&store, state.config().write_retries, game, move |mut game| {
            // The ordering invariant holds for whichever pair of dates is in
            // effect after this update.
            let effective_start = new_start.unwrap_or(game.start_date);
            let effective_end = new_end.unwrap_or(game.end_date);
            ensure_date_order(effective_start, effective_end)?;

            if let Some(title) = title.clone() {
                game.title = title;
            }
            if let Some(description) = description.clone() {
                game.description = description;
            }
            if let Some(tags) = tags.clone() {
                game.tags = tags;
            }
            if let Some(status) = publish_status {
                game.publish_status = status;
            }
            game.start_date = effective_start;
            game.end_date = effective_end;

            let merge = incoming_questions.clone().map(|incoming| {
                let outcome = merge_by_key(&game.questions, incoming);
                game.questions = outcome.merged;
                QuestionMergeStats {
                    added: outcome.added,
                    updated: outcome.updated,
                }
            });

            Ok((game, merge))
        })
        .await?;

    info!(game_id = %id, "updated game");
    Ok(GameUpdateReport { game, merge })
}

/// Run a read-modify-write cycle under the revision guard, reloading and
/// retrying when a concurrent writer got there first.
async fn apply_guarded<T>(
    store: &Arc<dyn GameStore>,
    retries: u32,
    mut game: GameEntity,
    mutate: impl Fn(GameEntity) -> Result<(GameEntity, T), ServiceError>,
) -> Result<(GameEntity, T), ServiceError> {
    let id = game.id.clone();
    let mut retries_left = retries;

    loop {
        let expected = game.revision;
        let (mut next, report) = mutate(game)?;
        next.revision = expected + 1;
        next.updated_at = SystemTime::now();

        if store.update_game_guarded(next.clone(), expected).await? {
            return Ok((next, report));
        }

        if retries_left == 0 {
            return Err(ServiceError::Conflict(format!(
                "game `{id}` was modified concurrently; giving up"
            )));
        }
        retries_left -= 1;

        game = store
            .find_game(id.clone())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` does not exist")))?;
    }
}

fn ensure_date_order(start: SystemTime, end: SystemTime) -> Result<(), ServiceError> {
    if start >= end {
        return Err(ServiceError::InvalidInput(
            "start date must be before end date".into(),
        ));
    }
    Ok(())
}

fn parse_date_field(value: &str, field: &str) -> Result<SystemTime, ServiceError> {
    parse_date(value).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "invalid {field} `{value}`; expected RFC 3339 or YYYY-MM-DD"
        ))
    })
}

/// Validate a batch of incoming questions and convert them into entities.
///
/// Timestamps are placeholders here; the merge engine stamps them against
/// the stored list.
fn build_questions(
    inputs: Vec<QuestionInput>,
    now: SystemTime,
) -> Result<Vec<QuestionEntity>, ServiceError> {
    inputs
        .into_iter()
        .map(|input| {
            let question_id = input.question_id;
            let question_type = QuestionType::from(input.question_type);

            let answer = resolve_encoding(input.correct_answer, input.correct_answers)
                .map_err(|err| invalid_question(&question_id, &err))?;
            validate_answer(&question_type, &input.options, &answer)
                .map_err(|err| invalid_question(&question_id, &err))?;

            Ok(QuestionEntity {
                question_id,
                question_type,
                question_text: input.question_text,
                options: input.options,
                correct_answer: answer,
                time_limit: input.time_limit,
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}

fn invalid_question(question_id: &str, err: &impl std::fmt::Display) -> ServiceError {
    ServiceError::InvalidInput(format!("question `{question_id}`: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_operation_wire_values() {
        assert_eq!(GameWriteOperation::Created.as_str(), "created");
        assert_eq!(GameWriteOperation::Updated.as_str(), "updated");
    }

    #[test]
    fn date_order_is_strict() {
        let now = SystemTime::now();
        assert!(ensure_date_order(now, now).is_err());
        assert!(ensure_date_order(now, now + std::time::Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn build_questions_names_the_offending_question() {
        let input = QuestionInput {
            question_id: "q9".to_owned(),
            question_type: "single-choice".to_owned(),
            question_text: "?".to_owned(),
            options: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            correct_answer: Some(crate::dao::models::CorrectAnswer::Index(5)),
            correct_answers: None,
            time_limit: None,
        };

        let err = build_questions(vec![input], SystemTime::now()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("q9"), "message was: {message}");
        assert!(message.contains("out of range"), "message was: {message}");
    }
}
