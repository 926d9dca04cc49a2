mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchArenaStore;

use crate::dao::storage::StorageError;

const BACKEND: &str = "couchdb";

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::AlreadyExists { .. } | CouchDaoError::Conflict { .. } => {
                StorageError::rejected(BACKEND, err.to_string())
            }
            other => StorageError::unavailable(BACKEND, other),
        }
    }
}
