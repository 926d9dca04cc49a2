use std::collections::HashSet;

use rand::distr::{Alphanumeric, SampleString};
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{ArenaEntity, ArenaStatus, SeatClaim},
    dto::ws::{JoinArenaPayload, ServerMessage, StartGamePayload, SubmitAnswerPayload},
    error::ServiceError,
    services::{arena_events, round_sequencer},
    state::{
        PlayerConnection, SharedState,
        arena::{Player, Verdict},
    },
};

const ARENA_ID_PREFIX: &str = "arena_";
const ARENA_ID_SUFFIX_LEN: usize = 12;

/// Fresh shareable arena identifier, e.g. `arena_k3x9q2m1zt0b`.
pub fn generate_arena_id() -> String {
    let suffix = Alphanumeric
        .sample_string(&mut rand::rng(), ARENA_ID_SUFFIX_LEN)
        .to_ascii_lowercase();
    format!("{ARENA_ID_PREFIX}{suffix}")
}

/// Create an arena hosted by `connection` and reply with its id.
pub async fn create_arena(
    state: &SharedState,
    connection: &PlayerConnection,
    username: String,
) -> Result<String, ServiceError> {
    let store = state.require_arena_store().await?;
    let arena_id = generate_arena_id();

    store
        .create_arena(ArenaEntity::new(arena_id.clone(), username.clone()))
        .await?;

    let handle = state.arenas().get_or_create(&arena_id);
    let mut arena = handle.lock().await;
    arena.seat_host(Player {
        username: username.clone(),
        connection: connection.clone(),
    })?;

    info!(arena = %arena_id, username = %username, "arena created");
    arena_events::send_to(
        connection,
        &ServerMessage::ArenaCreated {
            arena_id: arena_id.clone(),
        },
    );

    // The joiner may have been seated before the host.
    if arena.is_full() {
        arena_events::broadcast(&arena, &arena_events::arena_ready(&arena));
    }

    Ok(arena_id)
}

/// Seat `connection` as second player of an existing arena.
///
/// Returns the player names in seat order once the arena is ready.
pub async fn join_arena(
    state: &SharedState,
    connection: &PlayerConnection,
    payload: JoinArenaPayload,
) -> Result<Vec<String>, ServiceError> {
    let JoinArenaPayload { username, arena_id } = payload;
    let store = state.require_arena_store().await?;

    if let Some(handle) = state.arenas().get(&arena_id) {
        if handle.lock().await.has_connection(connection.id) {
            return Err(ServiceError::InvalidState(
                "You already joined this arena".into(),
            ));
        }
    }

    let record = store
        .find_arena(arena_id.clone())
        .await?
        .ok_or(ServiceError::ArenaNotFound)?;

    match record.status {
        ArenaStatus::Finished | ArenaStatus::Abandoned => {
            return Err(ServiceError::ArenaNotFound);
        }
        ArenaStatus::Ready => return Err(ServiceError::ArenaFull),
        ArenaStatus::Waiting => {}
    }
    if record.player2.is_some() {
        return Err(ServiceError::ArenaFull);
    }
    if record.player1 == username {
        return Err(ServiceError::UsernameTaken);
    }

    // The record may have changed while we awaited it: the claim re-checks the seat atomically.
    match store
        .claim_second_seat(arena_id.clone(), username.clone())
        .await?
    {
        SeatClaim::Claimed(_) => {}
        SeatClaim::AlreadyTaken => return Err(ServiceError::ArenaFull),
        SeatClaim::Missing => return Err(ServiceError::ArenaNotFound),
    }

    let handle = state.arenas().get_or_create(&arena_id);
    let mut arena = handle.lock().await;
    arena.add_player(Player {
        username: username.clone(),
        connection: connection.clone(),
    })?;

    info!(arena = %arena_id, username = %username, "player joined arena");

    let players = arena.player_names();
    if arena.is_full() {
        arena_events::broadcast(&arena, &arena_events::arena_ready(&arena));
    }
    Ok(players)
}

/// Start the game of an arena on behalf of one of its players.
pub async fn start_game(
    state: &SharedState,
    connection: &PlayerConnection,
    payload: StartGamePayload,
) -> Result<(), ServiceError> {
    let handle = state
        .arenas()
        .get(&payload.arena_id)
        .ok_or(ServiceError::ArenaNotFound)?;
    let mut arena = handle.lock().await;

    let round = arena.start(connection.id, state.catalog())?;
    info!(arena = %payload.arena_id, "game started");
    round_sequencer::begin_countdown(state, &arena, round.number);
    Ok(())
}

/// Record and judge an answer for the current round.
pub async fn submit_answer(
    state: &SharedState,
    connection: &PlayerConnection,
    payload: SubmitAnswerPayload,
) -> Result<(), ServiceError> {
    let SubmitAnswerPayload {
        arena_id,
        username,
        answer,
    } = payload;

    let handle = state
        .arenas()
        .get(&arena_id)
        .ok_or(ServiceError::ArenaNotFound)?;
    let mut arena = handle.lock().await;

    match arena.submit(connection.id, &username, answer)? {
        Verdict::Correct {
            round_number,
            winner,
        } => {
            round_sequencer::conclude_round(state, &arena, &winner, round_number);
        }
        Verdict::Wrong { retry } => {
            arena_events::send_to(connection, &ServerMessage::wrong_answer());
            if retry {
                round_sequencer::retry_round(state, &mut arena, ServerMessage::round_retry())?;
            }
        }
    }
    Ok(())
}

/// Tear down every arena `connection_id` was seated in.
///
/// Remaining players are told their opponent left; pending timers become stale
/// and the records are marked abandoned.
pub async fn handle_disconnect(
    state: &SharedState,
    connection_id: Uuid,
    arena_ids: &HashSet<String>,
) {
    for arena_id in arena_ids {
        let Some(handle) = state.arenas().get(arena_id) else {
            continue;
        };

        {
            let mut arena = handle.lock().await;
            if arena.remove_connection(connection_id).is_none() {
                continue;
            }
            arena.abandon();
            arena_events::broadcast(&arena, &ServerMessage::opponent_disconnected());
        }

        if state.arenas().remove(arena_id, &handle) {
            info!(arena = %arena_id, "arena abandoned after disconnect");
            round_sequencer::record_status(state, arena_id, ArenaStatus::Abandoned).await;
        }
    }
}
