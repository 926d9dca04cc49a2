use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for CouchDB arena operations.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The HTTP client could not be built.
    #[error("failed to build CouchDB HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request never got an answer.
    #[error("CouchDB request to `{path}` failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered with a status this store does not handle.
    #[error("CouchDB answered {status} for `{path}`")]
    UnexpectedStatus { path: String, status: StatusCode },
    /// The body of a successful response did not match the arena document shape.
    #[error("unreadable CouchDB document `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A document with the same id already exists.
    #[error("arena document `{doc_id}` already exists")]
    AlreadyExists { doc_id: String },
    /// Concurrent writers kept invalidating our revision.
    #[error("arena document `{doc_id}` still conflicting after {attempts} attempt(s)")]
    Conflict { doc_id: String, attempts: u32 },
}
