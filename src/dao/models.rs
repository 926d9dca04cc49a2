use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Lifecycle of a persisted arena record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArenaStatus {
    /// Created by the host, second seat still open.
    Waiting,
    /// Both seats are taken.
    Ready,
    /// All rounds were played.
    Finished,
    /// A player disconnected before the game concluded.
    Abandoned,
}

impl ArenaStatus {
    /// Wire representation, matching the serde encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Finished => "finished",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Durable arena metadata shared across storage backends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArenaEntity {
    /// Shareable arena identifier, also the primary key.
    pub id: String,
    /// Username of the host.
    pub player1: String,
    /// Username of the joiner, once the second seat is claimed.
    pub player2: Option<String>,
    /// Current lifecycle status.
    pub status: ArenaStatus,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the record was updated.
    pub updated_at: SystemTime,
}

impl ArenaEntity {
    /// Fresh record with the host in seat 1.
    pub fn new(id: impl Into<String>, player1: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            id: id.into(),
            player1: player1.into(),
            player2: None,
            status: ArenaStatus::Waiting,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record `username` in the second seat and mark the arena ready.
    pub fn with_second_player(mut self, username: impl Into<String>) -> Self {
        self.player2 = Some(username.into());
        self.status = ArenaStatus::Ready;
        self.updated_at = SystemTime::now();
        self
    }
}

/// Outcome of an atomic attempt to take the second seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatClaim {
    /// The seat was free and now belongs to the joiner.
    Claimed(ArenaEntity),
    /// Someone already holds the second seat.
    AlreadyTaken,
    /// No record exists for the id.
    Missing,
}
