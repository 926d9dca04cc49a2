use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::dto::validation::{validate_answer, validate_arena_id, validate_username};

/// Reason an inbound frame could not be turned into a [`ClientMessage`].
#[derive(Debug, Error)]
pub enum MessageError {
    /// Not JSON, unknown `event`, or fields of the wrong shape.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
    /// Well-formed JSON whose values break the payload rules.
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
/// Payload of `create-arena`.
pub struct CreateArenaPayload {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload of `join-arena`.
pub struct JoinArenaPayload {
    pub username: String,
    pub arena_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload of `start-game`.
pub struct StartGamePayload {
    pub arena_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload of `submit-answer`; `answer` lists 0-based, row-major cell indices.
pub struct SubmitAnswerPayload {
    pub arena_id: String,
    pub username: String,
    pub answer: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
/// Messages accepted from player WebSocket clients.
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientMessage {
    CreateArena(CreateArenaPayload),
    JoinArena(JoinArenaPayload),
    StartGame(StartGamePayload),
    SubmitAnswer(SubmitAnswerPayload),
}

impl Validate for ClientMessage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut check = |field: &'static str, result: Result<(), ValidationError>| {
            if let Err(e) = result {
                errors.add(field, e);
            }
        };

        match self {
            Self::CreateArena(payload) => {
                check("username", validate_username(&payload.username));
            }
            Self::JoinArena(payload) => {
                check("username", validate_username(&payload.username));
                check("arenaId", validate_arena_id(&payload.arena_id));
            }
            Self::StartGame(payload) => {
                check("arenaId", validate_arena_id(&payload.arena_id));
            }
            Self::SubmitAnswer(payload) => {
                check("arenaId", validate_arena_id(&payload.arena_id));
                check("username", validate_username(&payload.username));
                check("answer", validate_answer(&payload.answer));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ClientMessage {
    /// Decode and validate a text frame.
    pub fn from_json_str(text: &str) -> Result<Self, MessageError> {
        let message: Self = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }

    /// Event name, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::CreateArena(_) => "create-arena",
            Self::JoinArena(_) => "join-arena",
            Self::StartGame(_) => "start-game",
            Self::SubmitAnswer(_) => "submit-answer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
/// Messages pushed to player WebSocket clients.
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerMessage {
    ArenaCreated {
        #[serde(rename = "arenaId")]
        arena_id: String,
    },
    #[serde(rename = "arena_ready")]
    ArenaReady { players: Vec<String> },
    Countdown { message: String },
    RoundStart {
        #[serde(rename = "gridSize")]
        grid_size: String,
        pattern: Vec<u32>,
    },
    PatternClear,
    RoundResult { message: String },
    WrongAnswer { message: String },
    DuplicateSubmission { message: String },
    RoundAlreadyWon { message: String },
    RoundRetry { message: String },
    GameOver { message: String },
    OpponentDisconnected { message: String },
    Error { message: String },
}

impl ServerMessage {
    /// Countdown notice; the first round gets the short variant.
    pub fn countdown(round_number: u8) -> Self {
        let message = if round_number <= 1 {
            "3, 2, 1...".to_string()
        } else {
            "Next round starting in 3, 2, 1...".to_string()
        };
        Self::Countdown { message }
    }

    pub fn round_result(winner: &str, round_number: u8) -> Self {
        Self::RoundResult {
            message: format!("{winner} wins round {round_number}!"),
        }
    }

    pub fn wrong_answer() -> Self {
        Self::WrongAnswer {
            message: "Incorrect answer!".into(),
        }
    }

    pub fn round_retry() -> Self {
        Self::RoundRetry {
            message: "Both answers were incorrect! Retrying the round...".into(),
        }
    }

    pub fn answer_timeout() -> Self {
        Self::RoundRetry {
            message: "Time is up! Retrying the round...".into(),
        }
    }

    pub fn game_over(winner: Option<&str>) -> Self {
        let message = match winner {
            Some(winner) => format!("{winner} wins the game!"),
            None => "Game over!".into(),
        };
        Self::GameOver { message }
    }

    pub fn opponent_disconnected() -> Self {
        Self::OpponentDisconnected {
            message: "Your opponent disconnected. The arena has been closed.".into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
