use thiserror::Error;

/// Phases an arena moves through while a game is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaPhase {
    /// Waiting for players and for someone to start the game.
    Idle,
    /// Countdown notice sent; the pattern is about to be revealed.
    Countdown,
    /// The current round's pattern is visible to both players.
    PatternVisible,
    /// Pattern cleared; answers are being collected.
    AwaitingAnswers,
    /// A player won the round; the result is on screen before moving on.
    Resolving,
    /// The game concluded or was abandoned. Terminal.
    GameOver,
}

/// Events that can be applied to an arena's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaEvent {
    /// A player asked to start the game.
    Start,
    /// Countdown elapsed; reveal the pattern.
    Reveal,
    /// Reveal elapsed; hide the pattern and accept answers.
    ClearPattern,
    /// A correct answer decided the round.
    Decide,
    /// Nobody answered correctly; replay the same round.
    Retry,
    /// Result display elapsed and another round remains.
    NextRound,
    /// Result display elapsed after the final round.
    Finish,
    /// A player left; the arena is torn down.
    Abandon,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: ArenaPhase,
    /// The event that cannot be applied from this phase.
    pub event: ArenaEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: ArenaPhase,
    /// Generation of the state machine (increments on each transition).
    pub generation: u64,
}

/// Per-arena round state machine.
///
/// The generation counter doubles as the cancellation token for deferred steps:
/// a timer scheduled at generation `n` only acts if the arena is still at `n`
/// when it fires.
#[derive(Debug, Clone)]
pub struct ArenaStateMachine {
    phase: ArenaPhase,
    generation: u64,
}

impl Default for ArenaStateMachine {
    fn default() -> Self {
        Self {
            phase: ArenaPhase::Idle,
            generation: 0,
        }
    }
}

impl ArenaStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> ArenaPhase {
        self.phase
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            generation: self.generation,
        }
    }

    /// Apply `event`, returning the new phase. The generation is bumped on success.
    pub fn apply(&mut self, event: ArenaEvent) -> Result<ArenaPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.generation += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: ArenaEvent) -> Result<ArenaPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (ArenaPhase::Idle, ArenaEvent::Start) => ArenaPhase::Countdown,
            (ArenaPhase::Countdown, ArenaEvent::Reveal) => ArenaPhase::PatternVisible,
            (ArenaPhase::PatternVisible, ArenaEvent::ClearPattern) => ArenaPhase::AwaitingAnswers,
            (ArenaPhase::AwaitingAnswers, ArenaEvent::Decide) => ArenaPhase::Resolving,
            (ArenaPhase::AwaitingAnswers, ArenaEvent::Retry) => ArenaPhase::PatternVisible,
            (ArenaPhase::Resolving, ArenaEvent::NextRound) => ArenaPhase::Countdown,
            (ArenaPhase::Resolving, ArenaEvent::Finish) => ArenaPhase::GameOver,
            (from, ArenaEvent::Abandon) if from != ArenaPhase::GameOver => ArenaPhase::GameOver,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
