use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::list_games,
        crate::routes::game::get_game,
        crate::routes::game::update_game,
        crate::routes::game::merge_questions,
        crate::routes::game::add_user,
        crate::routes::game::generate_pin,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::UpdateGameRequest,
            crate::dto::game::GameDto,
            crate::dto::game::CreateGameResponse,
            crate::dto::game::ListGamesResponse,
            crate::dto::game::GetGameResponse,
            crate::dto::game::UpdateGameResponse,
            crate::dto::game::PinResponse,
            crate::dto::question::QuestionInput,
            crate::dto::question::QuestionDto,
            crate::dto::question::MergeQuestionsRequest,
            crate::dto::question::MergeQuestionsResponse,
            crate::dto::user::UserInput,
            crate::dto::user::AddUserRequest,
            crate::dto::user::UserDto,
            crate::dto::user::AddUserResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game CRUD, question/user merges, and PIN allocation"),
    )
)]
pub struct ApiDoc;
