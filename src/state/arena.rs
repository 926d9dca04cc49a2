use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use crate::state::{
    PlayerConnection,
    catalog::{Round, RoundCatalog},
    state_machine::{ArenaEvent, ArenaPhase, ArenaStateMachine, InvalidTransition},
};

/// Maximum number of seats in an arena.
pub const MAX_PLAYERS: usize = 2;

/// Violations of the arena rules, independent of transport and storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Both seats are already taken.
    #[error("arena is full")]
    Full,
    /// Another player in the arena already uses this username.
    #[error("username `{0}` is already taken in this arena")]
    UsernameTaken(String),
    /// The requesting connection does not own a seat in the arena.
    #[error("connection is not a player of this arena")]
    NotAPlayer,
    /// A game cannot start with a single player.
    #[error("arena is waiting for a second player")]
    NotReady,
    /// The game has already been started.
    #[error("game already in progress")]
    AlreadyStarted,
    /// No round is active yet.
    #[error("no active round")]
    NoActiveRound,
    /// The current round already has a winner.
    #[error("round {0} has already been won")]
    RoundAlreadyWon(u8),
    /// The username already answered the current round.
    #[error("`{0}` already submitted an answer for this round")]
    DuplicateSubmission(String),
    /// Answers are only accepted once the pattern has been cleared.
    #[error("answers are not accepted while in {0:?}")]
    RoundNotOpen(ArenaPhase),
    /// Underlying state machine refused the transition.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

/// A seated participant together with its live connection.
#[derive(Debug, Clone)]
pub struct Player {
    /// Name shown to the opponent, unique within the arena.
    pub username: String,
    /// Outbound channel owned by this seat.
    pub connection: PlayerConnection,
}

/// Answer recorded for the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Author of the answer.
    pub username: String,
    /// Cells as submitted, in the player's click order.
    pub answer: Vec<u32>,
}

/// Decisive outcome of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// Catalog number of the round.
    pub round_number: u8,
    /// Username that won the round.
    pub winner: Option<String>,
}

/// What a recorded submission means for the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// First correct answer: the round is won and the arena is now resolving.
    Correct {
        /// Round that was won.
        round_number: u8,
        /// Username of the winner.
        winner: String,
    },
    /// Incorrect answer. `retry` is set once every seat answered wrong.
    Wrong {
        /// Whether the round must be replayed.
        retry: bool,
    },
}

/// Where the arena goes after a round result has been shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Another round was loaded and the countdown restarts.
    NextRound(&'static Round),
    /// The catalog is exhausted.
    GameOver {
        /// Username with the most round wins.
        winner: Option<String>,
    },
}

/// One ongoing or pending match between at most two players.
#[derive(Debug)]
pub struct Arena {
    id: String,
    players: Vec<Player>,
    current_round: Option<&'static Round>,
    submissions: Vec<Submission>,
    round_results: Vec<RoundResult>,
    machine: ArenaStateMachine,
}

impl Arena {
    /// Empty arena, used when the joiner shows up before the creator is seated.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            players: Vec::with_capacity(MAX_PLAYERS),
            current_round: None,
            submissions: Vec::new(),
            round_results: Vec::new(),
            machine: ArenaStateMachine::new(),
        }
    }

    /// Shareable arena identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Seated players in join order (index 0 is the host).
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player names in join order.
    pub fn player_names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.username.clone()).collect()
    }

    /// Whether both seats are taken.
    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Current phase of the round state machine.
    pub fn phase(&self) -> ArenaPhase {
        self.machine.phase()
    }

    /// Generation used to discard stale deferred steps.
    pub fn generation(&self) -> u64 {
        self.machine.generation()
    }

    /// Round presently active, if the game started.
    pub fn current_round(&self) -> Option<&'static Round> {
        self.current_round
    }

    /// Answers recorded for the current round.
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Decisive results, one per resolved round.
    pub fn round_results(&self) -> &[RoundResult] {
        &self.round_results
    }

    /// Whether `connection_id` owns a seat.
    pub fn has_connection(&self, connection_id: Uuid) -> bool {
        self.players.iter().any(|p| p.connection.id == connection_id)
    }

    /// Seat the creator in front of anybody who joined first.
    pub fn seat_host(&mut self, host: Player) -> Result<(), ArenaError> {
        self.ensure_seat_available(&host.username)?;
        self.players.insert(0, host);
        Ok(())
    }

    /// Append a joiner after re-checking capacity and username uniqueness.
    pub fn add_player(&mut self, player: Player) -> Result<(), ArenaError> {
        self.ensure_seat_available(&player.username)?;
        self.players.push(player);
        Ok(())
    }

    fn ensure_seat_available(&self, username: &str) -> Result<(), ArenaError> {
        if self.is_full() {
            return Err(ArenaError::Full);
        }
        if self.players.iter().any(|p| p.username == username) {
            return Err(ArenaError::UsernameTaken(username.to_string()));
        }
        Ok(())
    }

    /// Drop the seat owned by `connection_id`, returning it if there was one.
    pub fn remove_connection(&mut self, connection_id: Uuid) -> Option<Player> {
        let index = self
            .players
            .iter()
            .position(|p| p.connection.id == connection_id)?;
        Some(self.players.remove(index))
    }

    /// Start the game on behalf of `connection_id`, loading the first round.
    pub fn start(
        &mut self,
        connection_id: Uuid,
        catalog: &RoundCatalog,
    ) -> Result<&'static Round, ArenaError> {
        if !self.has_connection(connection_id) {
            return Err(ArenaError::NotAPlayer);
        }
        if !self.is_full() {
            return Err(ArenaError::NotReady);
        }
        if self.phase() != ArenaPhase::Idle {
            return Err(ArenaError::AlreadyStarted);
        }

        self.machine.apply(ArenaEvent::Start)?;
        let round = catalog.first();
        self.submissions.clear();
        self.round_results.clear();
        self.current_round = Some(round);
        Ok(round)
    }

    /// Apply a timer-driven transition (reveal, clear).
    pub fn transition(&mut self, event: ArenaEvent) -> Result<ArenaPhase, ArenaError> {
        Ok(self.machine.apply(event)?)
    }

    /// Record an answer and judge it against the current round.
    ///
    /// The first correct answer wins the round outright; an incorrect one only
    /// triggers a retry once every seat has answered.
    pub fn submit(
        &mut self,
        connection_id: Uuid,
        username: &str,
        answer: Vec<u32>,
    ) -> Result<Verdict, ArenaError> {
        let round = self
            .current_round
            .filter(|_| self.phase() != ArenaPhase::GameOver)
            .ok_or(ArenaError::NoActiveRound)?;

        if self
            .round_results
            .iter()
            .any(|result| result.round_number == round.number)
        {
            return Err(ArenaError::RoundAlreadyWon(round.number));
        }

        if self.phase() != ArenaPhase::AwaitingAnswers {
            return Err(ArenaError::RoundNotOpen(self.phase()));
        }

        if !self
            .players
            .iter()
            .any(|p| p.username == username && p.connection.id == connection_id)
        {
            return Err(ArenaError::NotAPlayer);
        }

        if self.submissions.iter().any(|s| s.username == username) {
            return Err(ArenaError::DuplicateSubmission(username.to_string()));
        }

        let correct = matches_pattern(&answer, round.pattern);
        self.submissions.push(Submission {
            username: username.to_string(),
            answer,
        });

        if correct {
            self.machine.apply(ArenaEvent::Decide)?;
            self.round_results.push(RoundResult {
                round_number: round.number,
                winner: Some(username.to_string()),
            });
            return Ok(Verdict::Correct {
                round_number: round.number,
                winner: username.to_string(),
            });
        }

        Ok(Verdict::Wrong {
            retry: self.submissions.len() >= self.players.len(),
        })
    }

    /// Replay the current round: clear the answers and re-enter the reveal phase.
    pub fn begin_retry(&mut self) -> Result<&'static Round, ArenaError> {
        let round = self.current_round.ok_or(ArenaError::NoActiveRound)?;
        self.machine.apply(ArenaEvent::Retry)?;
        self.submissions.clear();
        Ok(round)
    }

    /// Leave the resolving phase, loading the next round or concluding the game.
    pub fn advance(&mut self, catalog: &RoundCatalog) -> Result<Advance, ArenaError> {
        let round = self.current_round.ok_or(ArenaError::NoActiveRound)?;

        match catalog.next_after(round.number) {
            Some(next) => {
                self.machine.apply(ArenaEvent::NextRound)?;
                self.submissions.clear();
                self.current_round = Some(next);
                Ok(Advance::NextRound(next))
            }
            None => {
                self.machine.apply(ArenaEvent::Finish)?;
                Ok(Advance::GameOver {
                    winner: self.overall_winner(),
                })
            }
        }
    }

    /// Mark the arena as abandoned so pending timers become stale.
    pub fn abandon(&mut self) {
        // Already over: nothing left to invalidate.
        let _ = self.machine.apply(ArenaEvent::Abandon);
    }

    /// Username with the most round wins.
    ///
    /// A seat only takes the lead with strictly more wins than the current
    /// leader, so equal counts resolve to the later seat.
    pub fn overall_winner(&self) -> Option<String> {
        let mut tally: IndexMap<&str, usize> = self
            .players
            .iter()
            .map(|p| (p.username.as_str(), 0))
            .collect();

        for winner in self.round_results.iter().filter_map(|r| r.winner.as_deref()) {
            *tally.entry(winner).or_insert(0) += 1;
        }

        tally
            .into_iter()
            .reduce(|leader, candidate| {
                if leader.1 > candidate.1 {
                    leader
                } else {
                    candidate
                }
            })
            .map(|(name, _)| name.to_string())
    }
}

/// Order-independent comparison of a submitted answer against a round pattern.
pub fn matches_pattern(answer: &[u32], pattern: &[u32]) -> bool {
    if answer.len() != pattern.len() {
        return false;
    }
    let mut answer = answer.to_vec();
    let mut pattern = pattern.to_vec();
    answer.sort_unstable();
    pattern.sort_unstable();
    answer == pattern
}

#[cfg(test)]
mod tests {
    use axum::extract::ws::Message;
    use tokio::sync::mpsc;

    use super::*;

    fn player(name: &str) -> (Player, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let player = Player {
            username: name.to_string(),
            connection: PlayerConnection {
                id: Uuid::new_v4(),
                tx,
            },
        };
        (player, rx)
    }

    struct Seats {
        arena: Arena,
        alice: Uuid,
        bob: Uuid,
        _rx: Vec<mpsc::UnboundedReceiver<Message>>,
    }

    fn seated_arena() -> Seats {
        let mut arena = Arena::new("arena_test");
        let (alice, alice_rx) = player("Alice");
        let (bob, bob_rx) = player("Bob");
        let (alice_id, bob_id) = (alice.connection.id, bob.connection.id);
        arena.seat_host(alice).unwrap();
        arena.add_player(bob).unwrap();
        Seats {
            arena,
            alice: alice_id,
            bob: bob_id,
            _rx: vec![alice_rx, bob_rx],
        }
    }

    fn open_answers(arena: &mut Arena) {
        arena.transition(ArenaEvent::Reveal).unwrap();
        arena.transition(ArenaEvent::ClearPattern).unwrap();
    }

    fn started() -> Seats {
        let mut seats = seated_arena();
        let catalog = RoundCatalog::new();
        seats.arena.start(seats.alice, &catalog).unwrap();
        open_answers(&mut seats.arena);
        seats
    }

    #[test]
    fn pattern_match_is_order_independent() {
        assert!(matches_pattern(&[5, 2, 4], &[2, 4, 5]));
        assert!(!matches_pattern(&[2, 4], &[2, 4, 5]));
        assert!(!matches_pattern(&[2, 4, 4], &[2, 4, 5]));
        assert!(!matches_pattern(&[0, 0, 0], &[2, 4, 5]));
    }

    #[test]
    fn third_player_is_rejected_without_mutation() {
        let mut seats = seated_arena();
        let (carol, _rx) = player("Carol");

        assert_eq!(seats.arena.add_player(carol), Err(ArenaError::Full));
        assert_eq!(seats.arena.player_names(), vec!["Alice", "Bob"]);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let mut arena = Arena::new("arena_dup");
        let (alice, _a) = player("Alice");
        let (impostor, _b) = player("Alice");
        arena.seat_host(alice).unwrap();

        assert_eq!(
            arena.add_player(impostor),
            Err(ArenaError::UsernameTaken("Alice".into()))
        );
    }

    #[test]
    fn host_keeps_first_seat_when_joiner_arrives_first() {
        let mut arena = Arena::new("arena_race");
        let (bob, _b) = player("Bob");
        let (alice, _a) = player("Alice");
        arena.add_player(bob).unwrap();
        arena.seat_host(alice).unwrap();

        assert_eq!(arena.player_names(), vec!["Alice", "Bob"]);
    }

    #[test]
    fn start_requires_two_players_and_membership() {
        let catalog = RoundCatalog::new();
        let mut arena = Arena::new("arena_solo");
        let (alice, _a) = player("Alice");
        let alice_id = alice.connection.id;
        arena.seat_host(alice).unwrap();

        assert_eq!(arena.start(alice_id, &catalog), Err(ArenaError::NotReady));
        assert_eq!(
            arena.start(Uuid::new_v4(), &catalog),
            Err(ArenaError::NotAPlayer)
        );
    }

    #[test]
    fn start_loads_round_one_once() {
        let catalog = RoundCatalog::new();
        let mut seats = seated_arena();

        let round = seats.arena.start(seats.bob, &catalog).unwrap();
        assert_eq!(round.number, 1);
        assert_eq!(seats.arena.phase(), ArenaPhase::Countdown);
        assert_eq!(
            seats.arena.start(seats.alice, &catalog),
            Err(ArenaError::AlreadyStarted)
        );
    }

    #[test]
    fn correct_answer_wins_round_immediately() {
        let mut seats = started();

        let verdict = seats.arena.submit(seats.alice, "Alice", vec![5, 2, 4]).unwrap();
        assert_eq!(
            verdict,
            Verdict::Correct {
                round_number: 1,
                winner: "Alice".into()
            }
        );
        assert_eq!(seats.arena.phase(), ArenaPhase::Resolving);
        assert_eq!(
            seats.arena.round_results(),
            &[RoundResult {
                round_number: 1,
                winner: Some("Alice".into())
            }]
        );
    }

    #[test]
    fn late_submission_after_win_is_rejected() {
        let mut seats = started();
        seats.arena.submit(seats.alice, "Alice", vec![2, 4, 5]).unwrap();

        assert_eq!(
            seats.arena.submit(seats.bob, "Bob", vec![2, 4, 5]),
            Err(ArenaError::RoundAlreadyWon(1))
        );
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let mut seats = started();
        seats.arena.submit(seats.alice, "Alice", vec![0, 0, 0]).unwrap();

        assert_eq!(
            seats.arena.submit(seats.alice, "Alice", vec![2, 4, 5]),
            Err(ArenaError::DuplicateSubmission("Alice".into()))
        );
        assert_eq!(seats.arena.submissions().len(), 1);
    }

    #[test]
    fn both_wrong_requests_retry() {
        let mut seats = started();

        assert_eq!(
            seats.arena.submit(seats.alice, "Alice", vec![0, 0, 0]).unwrap(),
            Verdict::Wrong { retry: false }
        );
        assert_eq!(
            seats.arena.submit(seats.bob, "Bob", vec![1, 1, 1]).unwrap(),
            Verdict::Wrong { retry: true }
        );

        let round = seats.arena.begin_retry().unwrap();
        assert_eq!(round.number, 1);
        assert!(seats.arena.submissions().is_empty());
        assert_eq!(seats.arena.phase(), ArenaPhase::PatternVisible);
        assert!(seats.arena.round_results().is_empty());
    }

    #[test]
    fn submissions_are_refused_before_pattern_clears() {
        let catalog = RoundCatalog::new();
        let mut seats = seated_arena();
        seats.arena.start(seats.alice, &catalog).unwrap();

        assert_eq!(
            seats.arena.submit(seats.alice, "Alice", vec![2, 4, 5]),
            Err(ArenaError::RoundNotOpen(ArenaPhase::Countdown))
        );
    }

    #[test]
    fn submissions_without_round_or_from_strangers_fail() {
        let mut seats = seated_arena();
        assert_eq!(
            seats.arena.submit(seats.alice, "Alice", vec![2, 4, 5]),
            Err(ArenaError::NoActiveRound)
        );

        let mut seats = started();
        assert_eq!(
            seats.arena.submit(seats.alice, "Bob", vec![2, 4, 5]),
            Err(ArenaError::NotAPlayer)
        );
    }

    #[test]
    fn advance_walks_the_catalog_then_ends() {
        let catalog = RoundCatalog::new();
        let mut seats = started();

        seats.arena.submit(seats.alice, "Alice", vec![2, 4, 5]).unwrap();
        let Advance::NextRound(round) = seats.arena.advance(&catalog).unwrap() else {
            panic!("expected a second round");
        };
        assert_eq!(round.number, 2);
        assert!(seats.arena.submissions().is_empty());

        open_answers(&mut seats.arena);
        seats.arena.submit(seats.bob, "Bob", vec![7, 6, 3, 1]).unwrap();
        seats.arena.advance(&catalog).unwrap();

        open_answers(&mut seats.arena);
        seats.arena.submit(seats.bob, "Bob", vec![0, 5, 10, 15]).unwrap();
        assert_eq!(
            seats.arena.advance(&catalog).unwrap(),
            Advance::GameOver {
                winner: Some("Bob".into())
            }
        );
        assert_eq!(seats.arena.phase(), ArenaPhase::GameOver);
    }

    #[test]
    fn overall_winner_ties_go_to_second_seat() {
        let mut seats = seated_arena();
        seats.arena.round_results = vec![
            RoundResult {
                round_number: 1,
                winner: Some("Alice".into()),
            },
            RoundResult {
                round_number: 2,
                winner: Some("Bob".into()),
            },
        ];
        assert_eq!(seats.arena.overall_winner().as_deref(), Some("Bob"));

        seats.arena.round_results.push(RoundResult {
            round_number: 3,
            winner: Some("Alice".into()),
        });
        assert_eq!(seats.arena.overall_winner().as_deref(), Some("Alice"));
    }

    #[test]
    fn removing_a_connection_frees_its_seat() {
        let mut seats = seated_arena();
        let removed = seats.arena.remove_connection(seats.bob).unwrap();
        assert_eq!(removed.username, "Bob");
        assert!(!seats.arena.has_connection(seats.bob));
        assert!(seats.arena.remove_connection(seats.bob).is_none());
    }
}
