use std::env;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const URI_VAR: &str = "MONGO_URI";
const DATABASE_VAR: &str = "MONGO_DB";
const DEFAULT_DATABASE: &str = "pattern_arena";

/// Parsed client options plus the database holding the `arenas` collection.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`, falling back to the default database name.
    pub async fn from_uri(uri: &str, database_name: Option<String>) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri).await.map_err(|source| {
            MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            }
        })?;
        Ok(Self {
            options,
            database_name: database_name.unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
        })
    }

    /// Configuration from `MONGO_URI` (required) and `MONGO_DB`.
    pub async fn from_env() -> MongoResult<Self> {
        let Ok(uri) = env::var(URI_VAR) else {
            return Err(MongoDaoError::MissingEnvVar { var: URI_VAR });
        };
        Self::from_uri(&uri, env::var(DATABASE_VAR).ok()).await
    }
}
