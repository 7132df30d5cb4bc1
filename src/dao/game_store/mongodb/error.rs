use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("write for game `{id}` collided with a unique index")]
    DuplicateKey { id: String },
    #[error("failed to save game `{id}`")]
    SaveGame {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game `{id}`")]
    LoadGame {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to look up game by title `{title}`")]
    FindByTitle {
        title: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    #[error("failed to list game pins")]
    ListPins {
        #[source]
        source: MongoError,
    },
}
