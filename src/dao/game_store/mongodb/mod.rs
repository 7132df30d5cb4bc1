mod connection;
mod error;
mod models;
/// MongoDB configuration loading.
pub mod config;
/// MongoDB-backed [`crate::dao::game_store::GameStore`] implementation.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoGameStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateKey { ref id } => {
                StorageError::conflict(format!("write for game `{id}` collided with a unique index"))
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_becomes_a_conflict() {
        let err: StorageError = MongoDaoError::DuplicateKey { id: "g1".into() }.into();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[test]
    fn other_backend_failures_stay_unavailable() {
        let err: StorageError = MongoDaoError::ListGames {
            source: mongodb::error::Error::custom("boom"),
        }
        .into();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
