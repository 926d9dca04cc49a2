//! Timed transitions of a running game: countdown, reveal, clear, result
//! display and the optional answer timeout.
//!
//! Every deferred step captures the arena generation it was scheduled at and
//! becomes a no-op if the arena was removed or moved on in the meantime.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    config::RoundTimings,
    dao::models::ArenaStatus,
    dto::ws::ServerMessage,
    services::arena_events,
    state::{
        SharedState,
        arena::{Advance, Arena, ArenaError},
        state_machine::ArenaEvent,
    },
};

/// Deferred step of the round sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedStep {
    /// Countdown elapsed: show the pattern.
    RevealPattern,
    /// Reveal elapsed: hide the pattern and open the answer window.
    ClearPattern,
    /// Result display elapsed: next round or game over.
    AdvanceRound,
    /// Nobody answered correctly in time: replay the round.
    AnswerTimeout,
}

impl TimedStep {
    /// Delay before the step fires, `None` when the step is disabled.
    fn delay(self, timings: &RoundTimings) -> Option<Duration> {
        match self {
            Self::RevealPattern => Some(timings.countdown),
            Self::ClearPattern => Some(timings.reveal),
            Self::AdvanceRound => Some(timings.result),
            Self::AnswerTimeout => timings.answer_timeout,
        }
    }
}

/// Schedule `step` for `arena`, bound to its current generation.
pub fn schedule(state: &SharedState, arena: &Arena, step: TimedStep) {
    let Some(delay) = step.delay(&state.config().timings) else {
        return;
    };

    let state = state.clone();
    let arena_id = arena.id().to_string();
    let generation = arena.generation();

    tokio::spawn(async move {
        sleep(delay).await;
        fire(&state, &arena_id, generation, step).await;
    });
}

/// Begin the countdown for the round that was just loaded.
pub fn begin_countdown(state: &SharedState, arena: &Arena, round_number: u8) {
    arena_events::broadcast(arena, &ServerMessage::countdown(round_number));
    schedule(state, arena, TimedStep::RevealPattern);
}

/// Announce the round winner and schedule the move to the next round.
pub fn conclude_round(state: &SharedState, arena: &Arena, winner: &str, round_number: u8) {
    info!(arena = %arena.id(), winner, round = round_number, "round won");
    arena_events::broadcast(arena, &ServerMessage::round_result(winner, round_number));
    schedule(state, arena, TimedStep::AdvanceRound);
}

/// Replay the current round after `notice`, re-broadcasting its pattern.
pub fn retry_round(
    state: &SharedState,
    arena: &mut Arena,
    notice: ServerMessage,
) -> Result<(), ArenaError> {
    let round = arena.begin_retry()?;
    info!(arena = %arena.id(), round = round.number, "retrying round");
    arena_events::broadcast(arena, &notice);
    arena_events::broadcast(arena, &arena_events::round_start(round));
    schedule(state, arena, TimedStep::ClearPattern);
    Ok(())
}

async fn fire(state: &SharedState, arena_id: &str, generation: u64, step: TimedStep) {
    let Some(handle) = state.arenas().get(arena_id) else {
        debug!(arena = %arena_id, ?step, "arena gone; dropping timer");
        return;
    };

    let mut arena = handle.lock().await;
    if arena.generation() != generation {
        debug!(
            arena = %arena_id,
            ?step,
            scheduled = generation,
            current = arena.generation(),
            "stale timer"
        );
        return;
    }

    debug!(arena = %arena_id, ?step, "timer fired");
    match run_step(state, &mut arena, step) {
        Ok(None) => {}
        Ok(Some(game_over)) => {
            // Unregister first so nothing new reaches the finished arena.
            state.arenas().remove(arena_id, &handle);
            arena_events::broadcast(&arena, &game_over);
            drop(arena);
            record_status(state, arena_id, ArenaStatus::Finished).await;
        }
        Err(err) => warn!(arena = %arena_id, ?step, error = %err, "timed step failed"),
    }
}

/// Run one step against a locked arena, returning the game-over event once the
/// catalog is exhausted.
fn run_step(
    state: &SharedState,
    arena: &mut Arena,
    step: TimedStep,
) -> Result<Option<ServerMessage>, ArenaError> {
    match step {
        TimedStep::RevealPattern => {
            let round = arena.current_round().ok_or(ArenaError::NoActiveRound)?;
            arena.transition(ArenaEvent::Reveal)?;
            arena_events::broadcast(arena, &arena_events::round_start(round));
            schedule(state, arena, TimedStep::ClearPattern);
        }
        TimedStep::ClearPattern => {
            arena.transition(ArenaEvent::ClearPattern)?;
            arena_events::broadcast(arena, &ServerMessage::PatternClear);
            schedule(state, arena, TimedStep::AnswerTimeout);
        }
        TimedStep::AnswerTimeout => {
            retry_round(state, arena, ServerMessage::answer_timeout())?;
        }
        TimedStep::AdvanceRound => match arena.advance(state.catalog())? {
            Advance::NextRound(round) => begin_countdown(state, arena, round.number),
            Advance::GameOver { winner } => {
                info!(arena = %arena.id(), winner = ?winner, "game over");
                return Ok(Some(ServerMessage::game_over(winner.as_deref())));
            }
        },
    }
    Ok(None)
}

/// Best-effort status update of the persisted arena record.
pub async fn record_status(state: &SharedState, arena_id: &str, status: ArenaStatus) {
    let Some(store) = state.arena_store().await else {
        warn!(arena = %arena_id, status = status.as_str(), "no storage; status not recorded");
        return;
    };
    if let Err(err) = store.update_status(arena_id.to_string(), status).await {
        warn!(
            arena = %arena_id,
            status = status.as_str(),
            error = %err,
            "failed to record arena status"
        );
    }
}
