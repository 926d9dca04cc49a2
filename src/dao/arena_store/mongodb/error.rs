use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// Result alias for MongoDB arena operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failures talking to MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("cannot parse MongoDB URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("cannot build MongoDB client")]
    Client {
        #[source]
        source: MongoError,
    },
    /// The server never answered a ping while connecting.
    #[error("MongoDB unreachable after {attempts} ping(s)")]
    Unreachable {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed")]
    Ping {
        #[source]
        source: MongoError,
    },
    #[error("cannot create index `{name}` on arenas")]
    Index {
        name: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("arena `{arena_id}` already exists")]
    DuplicateArena { arena_id: String },
    #[error("cannot insert arena `{arena_id}`")]
    Insert {
        arena_id: String,
        #[source]
        source: MongoError,
    },
    #[error("cannot read arena `{arena_id}`")]
    Query {
        arena_id: String,
        #[source]
        source: MongoError,
    },
    #[error("cannot update arena `{arena_id}`")]
    Update {
        arena_id: String,
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Classify a failed insert, separating id collisions from outages.
    pub fn from_insert(arena_id: String, source: MongoError) -> Self {
        match source.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write))
                if write.code == DUPLICATE_KEY_CODE =>
            {
                Self::DuplicateArena { arena_id }
            }
            _ => Self::Insert { arena_id, source },
        }
    }
}
