//! Shared application state: the injected store handle and degraded-mode flag.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{config::AppConfig, dao::game_store::GameStore, error::ServiceError};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state holding the injected store and configuration.
///
/// Handlers never open or close database connections themselves; they borrow
/// whatever store the supervisor has installed, and fail with
/// [`ServiceError::Degraded`] while none is available. Degraded mode is the
/// absence of an installed store, nothing more.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            game_store: RwLock::new(None),
            config,
        })
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current game store or fail with a degraded-mode error.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation, leaving degraded mode.
    pub async fn install_game_store(&self, store: Arc<dyn GameStore>) {
        let mut guard = self.game_store.write().await;
        *guard = Some(store);
    }

    /// Remove the current game store, entering degraded mode.
    pub async fn clear_game_store(&self) {
        let mut guard = self.game_store.write().await;
        guard.take();
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.game_store.read().await;
        guard.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::game_store::memory::MemoryGameStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_game_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .install_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(state.require_game_store().await.is_ok());

        state.clear_game_store().await;
        assert!(state.is_degraded().await);
    }
}
