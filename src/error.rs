use thiserror::Error;

use crate::{
    dao::storage::StorageError,
    dto::ws::{MessageError, ServerMessage},
    state::arena::ArenaError,
};

/// Errors that can occur in service layer operations.
///
/// Every variant is recoverable: it is reported to the originating connection
/// and the connection stays open.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No live arena (or persisted record) matches the id.
    #[error("Arena not found")]
    ArenaNotFound,
    /// Both seats are already taken.
    #[error("Only two players are allowed!")]
    ArenaFull,
    /// The joiner picked the host's username.
    #[error("Username already taken in this arena")]
    UsernameTaken,
    /// A late answer arrived after the round was decided.
    #[error("This round has already been won.")]
    RoundAlreadyWon,
    /// The player already answered the current round.
    #[error("You have already submitted your answer for this round.")]
    DuplicateSubmission,
    /// The inbound frame could not be decoded or validated.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    /// The connection does not own a seat in the arena.
    #[error("You are not a player in this arena")]
    NotAPlayer,
    /// Operation cannot be performed in the current state.
    #[error("{0}")]
    InvalidState(String),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
}

impl ServiceError {
    /// Event reported to the connection that triggered the error.
    pub fn to_server_message(&self) -> ServerMessage {
        let message = self.to_string();
        match self {
            ServiceError::DuplicateSubmission => ServerMessage::DuplicateSubmission { message },
            ServiceError::RoundAlreadyWon => ServerMessage::RoundAlreadyWon { message },
            _ => ServerMessage::Error { message },
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        if err.is_unavailable() {
            ServiceError::Unavailable(err)
        } else {
            ServiceError::InvalidState("Arena could not be saved, please retry".into())
        }
    }
}

impl From<MessageError> for ServiceError {
    fn from(err: MessageError) -> Self {
        ServiceError::MalformedMessage(err.to_string())
    }
}

impl From<ArenaError> for ServiceError {
    fn from(err: ArenaError) -> Self {
        match err {
            ArenaError::Full => ServiceError::ArenaFull,
            ArenaError::UsernameTaken(_) => ServiceError::UsernameTaken,
            ArenaError::NotAPlayer => ServiceError::NotAPlayer,
            ArenaError::NotReady => ServiceError::InvalidState("Waiting for a second player".into()),
            ArenaError::AlreadyStarted => {
                ServiceError::InvalidState("Game already in progress".into())
            }
            // An arena without a round has nothing to answer to.
            ArenaError::NoActiveRound => ServiceError::ArenaNotFound,
            ArenaError::RoundAlreadyWon(_) => ServiceError::RoundAlreadyWon,
            ArenaError::DuplicateSubmission(_) => ServiceError::DuplicateSubmission,
            ArenaError::RoundNotOpen(_) => {
                ServiceError::InvalidState("Answers are not being accepted right now".into())
            }
            ArenaError::InvalidTransition(invalid) => {
                ServiceError::InvalidState(invalid.to_string())
            }
        }
    }
}
