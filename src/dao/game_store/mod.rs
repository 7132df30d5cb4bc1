/// In-memory backend used by tests and local development.
pub mod memory;
/// MongoDB-backed store.
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::GameEntity;
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for game documents.
///
/// The whole API is keyed by the game's string id; embedded question and user
/// lists travel inside the [`GameEntity`]. Guarded writes carry the revision
/// the caller read so concurrent read-modify-write cycles are detected
/// instead of silently dropped.
pub trait GameStore: Send + Sync {
    /// Insert a brand-new game document. Fails if the id already exists.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a game document wholesale, creating it when absent.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a game document only if the stored revision still matches
    /// `expected_revision`; returns whether the write was applied.
    fn update_game_guarded(
        &self,
        game: GameEntity,
        expected_revision: u64,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn find_game_by_title(
        &self,
        title: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// All pins currently assigned across the collection.
    fn list_pins(&self) -> BoxFuture<'static, StorageResult<Vec<String>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
