use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::GameDocument,
};
use crate::dao::{game_store::GameStore, models::GameEntity, storage::StorageResult};

const GAME_COLLECTION_NAME: &str = "games";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB implementation of the game store.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

/// Any write can trip a unique index (`_id` on insert, `gamePin` on pin
/// assignment races between instances); surface those as conflicts.
fn map_write_error(id: &str, source: MongoError) -> MongoDaoError {
    if is_duplicate_key(&source) {
        MongoDaoError::DuplicateKey { id: id.to_owned() }
    } else {
        MongoDaoError::SaveGame {
            id: id.to_owned(),
            source,
        }
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let collection = database.collection::<mongodb::bson::Document>(GAME_COLLECTION_NAME);

        // Pins must stay unique across the whole collection; sparse so games
        // without a pin are not counted as duplicates of each other.
        let pin_index = mongodb::IndexModel::builder()
            .keys(doc! {"gamePin": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_pin_idx".to_owned()))
                    .unique(Some(true))
                    .sparse(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(pin_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "gamePin",
                source,
            })?;

        let title_index = mongodb::IndexModel::builder()
            .keys(doc! {"title": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_title_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(title_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "title",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection(&self) -> Collection<GameDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<GameDocument>(GAME_COLLECTION_NAME)
    }

    async fn insert_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id.clone();
        let document: GameDocument = game.into();
        let collection = self.collection().await;
        collection
            .insert_one(&document)
            .await
            .map_err(|source| map_write_error(&id, source))?;
        Ok(())
    }

    async fn save_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id.clone();
        let document: GameDocument = game.into();
        let collection = self.collection().await;
        collection
            .replace_one(doc! {"_id": &id}, &document)
            .upsert(true)
            .await
            .map_err(|source| map_write_error(&id, source))?;
        Ok(())
    }

    async fn update_game_guarded(
        &self,
        game: GameEntity,
        expected_revision: u64,
    ) -> MongoResult<bool> {
        let id = game.id.clone();
        let document: GameDocument = game.into();
        let collection = self.collection().await;

        // Legacy documents predating the revision counter deserialize as 0,
        // which the filter matches through the $exists arm below.
        let revision = expected_revision as i64;
        let filter = if revision == 0 {
            doc! {"_id": &id, "$or": [
                {"revision": {"$exists": false}},
                {"revision": 0},
            ]}
        } else {
            doc! {"_id": &id, "revision": revision}
        };

        let result = collection
            .replace_one(filter, &document)
            .await
            .map_err(|source| map_write_error(&id, source))?;
        Ok(result.matched_count > 0)
    }

    async fn find_game(&self, id: String) -> MongoResult<Option<GameEntity>> {
        let collection = self.collection().await;
        let document = collection
            .find_one(doc! {"_id": &id})
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_game_by_title(&self, title: String) -> MongoResult<Option<GameEntity>> {
        let collection = self.collection().await;
        let document = collection
            .find_one(doc! {"title": &title})
            .await
            .map_err(|source| MongoDaoError::FindByTitle { title, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_games(&self) -> MongoResult<Vec<GameEntity>> {
        let collection = self.collection().await;
        let documents: Vec<GameDocument> = collection
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_pins(&self) -> MongoResult<Vec<String>> {
        let collection = self.collection().await;
        let documents: Vec<GameDocument> = collection
            .find(doc! {"gamePin": {"$type": "string"}})
            .await
            .map_err(|source| MongoDaoError::ListPins { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListPins { source })?;

        Ok(documents
            .into_iter()
            .filter_map(|document| document.game_pin)
            .collect())
    }
}

impl GameStore for MongoGameStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn update_game_guarded(
        &self,
        game: GameEntity,
        expected_revision: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_game_guarded(game, expected_revision)
                .await
                .map_err(Into::into)
        })
    }

    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn find_game_by_title(
        &self,
        title: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game_by_title(title).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn list_pins(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move { store.list_pins().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
