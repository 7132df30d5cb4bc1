use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::game_store::GameStore;
use crate::dao::models::GameEntity;
use crate::dao::storage::{StorageError, StorageResult};

/// Process-local [`GameStore`] backed by a [`DashMap`].
///
/// Used by the test suite as the injected store substitute; it mirrors the
/// revision-guard semantics of the MongoDB backend and counts writes so tests
/// can assert idempotence.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<String, GameEntity>,
    writes: AtomicU64,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations applied so far (inserts and replaces).
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl GameStore for MemoryGameStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let entry = store.inner.games.entry(game.id.clone());
            match entry {
                dashmap::mapref::entry::Entry::Occupied(_) => Err(StorageError::conflict(
                    format!("game `{}` already exists", game.id),
                )),
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(game);
                    store.record_write();
                    Ok(())
                }
            }
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.games.insert(game.id.clone(), game);
            store.record_write();
            Ok(())
        })
    }

    fn update_game_guarded(
        &self,
        game: GameEntity,
        expected_revision: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(mut slot) = store.inner.games.get_mut(&game.id) else {
                return Ok(false);
            };
            if slot.revision != expected_revision {
                return Ok(false);
            }
            *slot = game;
            drop(slot);
            store.record_write();
            Ok(true)
        })
    }

    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.games.get(&id).map(|entry| entry.clone())) })
    }

    fn find_game_by_title(
        &self,
        title: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .games
                .iter()
                .find(|entry| entry.title == title)
                .map(|entry| entry.clone()))
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut games: Vec<GameEntity> = store
                .inner
                .games
                .iter()
                .map(|entry| entry.clone())
                .collect();
            // DashMap iteration order is arbitrary; keep listings stable.
            games.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(games)
        })
    }

    fn list_pins(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .games
                .iter()
                .filter_map(|entry| entry.game_pin.clone())
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn sample_game(id: &str) -> GameEntity {
        GameEntity::shell(id.to_owned(), SystemTime::now())
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryGameStore::new();
        store.insert_game(sample_game("g1")).await.unwrap();
        let err = store.insert_game(sample_game("g1")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn guarded_update_detects_stale_revision() {
        let store = MemoryGameStore::new();
        let mut game = sample_game("g1");
        store.insert_game(game.clone()).await.unwrap();

        game.revision = 1;
        assert!(store.update_game_guarded(game.clone(), 0).await.unwrap());
        // A second writer still holding revision 0 must miss.
        assert!(!store.update_game_guarded(game, 0).await.unwrap());
    }

    #[tokio::test]
    async fn list_pins_skips_games_without_pin() {
        let store = MemoryGameStore::new();
        let mut with_pin = sample_game("g1");
        with_pin.game_pin = Some("123456".to_owned());
        store.insert_game(with_pin).await.unwrap();
        store.insert_game(sample_game("g2")).await.unwrap();

        assert_eq!(store.list_pins().await.unwrap(), vec!["123456".to_owned()]);
    }
}
