use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::game::{
        CreateGameRequest, CreateGameResponse, GameDto, GetGameResponse, ListGamesResponse,
        PinResponse, UpdateGameRequest, UpdateGameResponse,
    },
    dto::question::{MergeQuestionsRequest, MergeQuestionsResponse},
    dto::user::{AddUserRequest, AddUserResponse},
    error::AppError,
    services::{game_service, pin_service},
    state::SharedState,
};

/// Routes handling game CRUD, list merges, and pin allocation.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game).get(list_games))
        .route("/games/{id}", get(get_game).put(update_game))
        .route("/games/{id}/questions", post(merge_questions))
        .route("/games/{id}/users", post(add_user))
        .route("/games/{id}/pin", post(generate_pin))
}

/// Create a fresh game document and persist it.
#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = CreateGameResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Duplicate id or title"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Response, AppError> {
    let game = game_service::create_game(&state, payload).await?;
    let body = CreateGameResponse {
        success: true,
        message: "Game created successfully".to_owned(),
        id: game.id.clone(),
        game: game.into(),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// List every stored game.
#[utoipa::path(
    get,
    path = "/games",
    tag = "game",
    responses(
        (status = 200, description = "All stored games", body = ListGamesResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<ListGamesResponse>, AppError> {
    let games = game_service::list_games(&state).await?;
    let games: Vec<GameDto> = games.into_iter().map(Into::into).collect();
    let count = games.len();
    Ok(Json(ListGamesResponse {
        success: true,
        games,
        count,
    }))
}

/// Fetch one game by id.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "The requested game", body = GetGameResponse),
        (status = 404, description = "No game with this id", body = GetGameResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match game_service::get_game(&state, &id).await? {
        Some(game) => {
            let body = GetGameResponse {
                success: true,
                game: Some(game.into()),
                message: None,
            };
            Ok(Json(body).into_response())
        }
        None => {
            let body = GetGameResponse {
                success: false,
                game: None,
                message: Some("Game not found".to_owned()),
            };
            Ok((StatusCode::NOT_FOUND, Json(body)).into_response())
        }
    }
}

/// Apply a partial update to a game; supplied questions are merged by id.
#[utoipa::path(
    put,
    path = "/games/{id}",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    request_body = UpdateGameRequest,
    responses(
        (status = 200, description = "Game updated", body = UpdateGameResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "No game with this id"),
        (status = 409, description = "Lost a concurrent-write race"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn update_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<UpdateGameRequest>>,
) -> Result<Json<UpdateGameResponse>, AppError> {
    let report = game_service::update_game(&state, &id, payload).await?;
    let total_questions = report.merge.as_ref().map(|_| report.game.questions.len());
    let (added_questions, updated_questions) = match report.merge {
        Some(stats) => (Some(stats.added), Some(stats.updated)),
        None => (None, None),
    };

    Ok(Json(UpdateGameResponse {
        success: true,
        message: "Game updated successfully".to_owned(),
        game: report.game.into(),
        total_questions,
        added_questions,
        updated_questions,
    }))
}

/// Merge a batch of questions into a game, creating the game when absent.
#[utoipa::path(
    post,
    path = "/games/{id}/questions",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    request_body = MergeQuestionsRequest,
    responses(
        (status = 200, description = "Questions merged", body = MergeQuestionsResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Lost a concurrent-write race"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn merge_questions(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<MergeQuestionsRequest>>,
) -> Result<Json<MergeQuestionsResponse>, AppError> {
    let report = game_service::merge_questions(&state, &id, payload.questions).await?;

    Ok(Json(MergeQuestionsResponse {
        success: true,
        game_id: report.game.id.clone(),
        total_questions: report.game.questions.len(),
        added_count: report.added.len(),
        updated_count: report.updated.len(),
        added_questions: report.added,
        updated_questions: report.updated,
        operation: report.operation.as_str().to_owned(),
    }))
}

/// Add a participant to a game or update the matching entry in place.
#[utoipa::path(
    post,
    path = "/games/{id}/users",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    request_body = AddUserRequest,
    responses(
        (status = 200, description = "User merged into the game", body = AddUserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "No game with this id"),
        (status = 409, description = "Lost a concurrent-write race"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn add_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<AddUserRequest>>,
) -> Result<Json<AddUserResponse>, AppError> {
    let user_name = payload.user.user_name.clone();
    let report = game_service::add_user(&state, &id, payload.user).await?;

    let message = if report.is_new_user {
        format!("User '{user_name}' successfully added to game")
    } else {
        format!("User '{user_name}' successfully updated in game")
    };

    Ok(Json(AddUserResponse {
        success: true,
        message,
        total_users: report.game.users.len(),
        is_new_user: report.is_new_user,
        is_updated: !report.is_new_user,
        game: report.game.into(),
    }))
}

/// Return the game's six-digit pin, allocating one when absent.
#[utoipa::path(
    post,
    path = "/games/{id}/pin",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Assigned or existing pin", body = PinResponse),
        (status = 400, description = "Blank game id"),
        (status = 500, description = "Pin space exhausted"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn generate_pin(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PinResponse>, AppError> {
    let assignment = pin_service::generate_game_pin(&state, &id).await?;
    Ok(Json(PinResponse {
        gamepin: assignment.pin,
        id,
    }))
}
