use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Build the `/healthcheck` payload, pinging the game store when one is
/// installed.
///
/// A failed ping is logged but does not flip the response on its own; the
/// storage supervisor owns the degraded flag and this endpoint reports it.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Ok(store) = state.require_game_store().await else {
        warn!("no game store installed; reporting degraded");
        return HealthResponse::degraded();
    };

    if let Err(err) = store.health_check().await {
        warn!(error = %err, "game store ping failed");
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
