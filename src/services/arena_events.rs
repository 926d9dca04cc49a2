use axum::extract::ws::Message;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    dto::ws::ServerMessage,
    state::{PlayerConnection, arena::Arena, catalog::Round},
};

/// The writer task behind a connection is gone.
#[derive(Debug, Error)]
#[error("connection closed")]
pub struct ConnectionClosed;

/// Serialize a message and push it onto a connection's outbound channel.
///
/// A serialization failure is logged and swallowed: it is a bug, not a
/// transport problem. A closed writer is reported to the caller.
pub fn send_message(
    tx: &mpsc::UnboundedSender<Message>,
    message: &ServerMessage,
) -> Result<(), ConnectionClosed> {
    let Some(payload) = encode(message) else {
        return Ok(());
    };
    tx.send(Message::Text(payload.into()))
        .map_err(|_| ConnectionClosed)
}

/// Send a message to a single player, logging if the connection is gone.
pub fn send_to(connection: &PlayerConnection, message: &ServerMessage) {
    if send_message(&connection.tx, message).is_err() {
        debug!(connection = %connection.id, "dropping message for closed connection");
    }
}

/// Send `message` to every seated player, in seat order.
///
/// Delivery is fire-and-forget; closed connections are skipped and cleaned up
/// by their own socket task.
pub fn broadcast(arena: &Arena, message: &ServerMessage) {
    let Some(payload) = encode(message) else {
        return;
    };

    for player in arena.players() {
        if player
            .connection
            .tx
            .send(Message::Text(payload.clone().into()))
            .is_err()
        {
            debug!(
                arena = %arena.id(),
                username = %player.username,
                "skipping closed connection during broadcast"
            );
        }
    }
}

/// `round-start` event for `round`.
pub fn round_start(round: &Round) -> ServerMessage {
    ServerMessage::RoundStart {
        grid_size: round.grid_size.to_string(),
        pattern: round.pattern.to_vec(),
    }
}

/// `arena_ready` event listing the players of `arena` in seat order.
pub fn arena_ready(arena: &Arena) -> ServerMessage {
    ServerMessage::ArenaReady {
        players: arena.player_names(),
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{message:?}`");
            None
        }
    }
}
