mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoArenaStore;

use crate::dao::storage::StorageError;

const BACKEND: &str = "mongodb";

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateArena { .. } => StorageError::rejected(BACKEND, err.to_string()),
            other => StorageError::unavailable(BACKEND, other),
        }
    }
}
