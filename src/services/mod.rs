/// Answer-encoding normalization and validation.
pub mod answer_schema;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game CRUD and list-merge orchestration.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Keyed list merging shared by questions and users.
pub mod merge;
/// Six-digit join-code allocation.
pub mod pin_service;
/// Storage connection supervisor with reconnect and degraded mode.
pub mod storage_supervisor;
