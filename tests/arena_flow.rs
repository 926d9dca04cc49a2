use std::{sync::Arc, time::Duration};

use axum::extract::ws::Message;
use pattern_arena_back::{
    config::{AppConfig, RoundTimings},
    dao::{
        arena_store::{ArenaStore, memory::InMemoryArenaStore},
        models::{ArenaEntity, ArenaStatus},
    },
    services::websocket_service::PlayerSession,
    state::{AppState, SharedState},
};
use serde_json::{Value, json};
use tokio::{sync::mpsc, time::timeout};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn fast_timings() -> RoundTimings {
    RoundTimings {
        countdown: Duration::from_millis(20),
        reveal: Duration::from_millis(20),
        result: Duration::from_millis(20),
        answer_timeout: None,
    }
}

async fn setup(timings: RoundTimings) -> (SharedState, Arc<InMemoryArenaStore>) {
    let store = Arc::new(InMemoryArenaStore::new());
    let config = AppConfig {
        timings,
        ..AppConfig::default()
    };
    let state = AppState::with_store(config, store.clone()).await;
    (state, store)
}

/// A player connection backed by an in-process channel.
struct TestClient {
    session: PlayerSession,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl TestClient {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: PlayerSession::new(tx),
            rx,
        }
    }

    async fn send(&mut self, state: &SharedState, message: Value) {
        self.session.handle_text(state, &message.to_string()).await;
    }

    async fn recv(&mut self) -> Value {
        let message = timeout(RECV_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("connection channel closed");
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    async fn expect(&mut self, event: &str) -> Value {
        let message = self.recv().await;
        assert_eq!(message["event"], event, "unexpected message: {message}");
        message
    }

    fn assert_no_message(&mut self) {
        if let Ok(message) = self.rx.try_recv() {
            panic!("unexpected message: {message:?}");
        }
    }
}

/// Alice hosts, Bob joins; both have consumed `arena_ready`.
async fn ready_arena(state: &SharedState) -> (TestClient, TestClient, String) {
    let mut alice = TestClient::new();
    let mut bob = TestClient::new();

    alice
        .send(state, json!({"event": "create-arena", "username": "Alice"}))
        .await;
    let created = alice.expect("arena-created").await;
    let arena_id = created["arenaId"].as_str().unwrap().to_string();
    assert!(arena_id.starts_with("arena_"));

    bob.send(
        state,
        json!({"event": "join-arena", "username": "Bob", "arenaId": arena_id}),
    )
    .await;

    let ready = json!({"event": "arena_ready", "players": ["Alice", "Bob"]});
    assert_eq!(alice.recv().await, ready);
    assert_eq!(bob.recv().await, ready);

    (alice, bob, arena_id)
}

/// Consume the countdown, reveal and clear of a round on both connections.
async fn play_until_answers_open(
    alice: &mut TestClient,
    bob: &mut TestClient,
    countdown: &str,
    grid_size: &str,
    pattern: Value,
) {
    for client in [&mut *alice, &mut *bob] {
        assert_eq!(
            client.recv().await,
            json!({"event": "countdown", "message": countdown})
        );
    }
    for client in [&mut *alice, &mut *bob] {
        assert_eq!(
            client.recv().await,
            json!({"event": "round-start", "gridSize": grid_size, "pattern": pattern})
        );
    }
    for client in [alice, bob] {
        assert_eq!(client.recv().await, json!({"event": "pattern-clear"}));
    }
}

/// The status update runs after the final broadcast, so poll for it.
async fn wait_for_status(
    store: &InMemoryArenaStore,
    arena_id: &str,
    status: ArenaStatus,
) -> ArenaEntity {
    for _ in 0..50 {
        let record = store.find_arena(arena_id.to_string()).await.unwrap().unwrap();
        if record.status == status {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("arena {arena_id} never reached {status:?}");
}

fn submit(arena_id: &str, username: &str, answer: Value) -> Value {
    json!({
        "event": "submit-answer",
        "arenaId": arena_id,
        "username": username,
        "answer": answer,
    })
}

#[tokio::test]
async fn full_game_runs_three_rounds_and_removes_the_arena() {
    let (state, store) = setup(fast_timings()).await;
    let (mut alice, mut bob, arena_id) = ready_arena(&state).await;

    alice
        .send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    play_until_answers_open(&mut alice, &mut bob, "3, 2, 1...", "3x3", json!([2, 4, 5])).await;

    // Order does not matter for correctness.
    alice.send(&state, submit(&arena_id, "Alice", json!([5, 2, 4]))).await;
    let won = json!({"event": "round-result", "message": "Alice wins round 1!"});
    assert_eq!(alice.recv().await, won);
    assert_eq!(bob.recv().await, won);

    play_until_answers_open(
        &mut alice,
        &mut bob,
        "Next round starting in 3, 2, 1...",
        "3x4",
        json!([1, 3, 6, 7]),
    )
    .await;
    bob.send(&state, submit(&arena_id, "Bob", json!([7, 6, 3, 1]))).await;
    let won = json!({"event": "round-result", "message": "Bob wins round 2!"});
    assert_eq!(alice.recv().await, won);
    assert_eq!(bob.recv().await, won);

    play_until_answers_open(
        &mut alice,
        &mut bob,
        "Next round starting in 3, 2, 1...",
        "4x4",
        json!([0, 5, 10, 15]),
    )
    .await;
    alice
        .send(&state, submit(&arena_id, "Alice", json!([0, 5, 10, 15])))
        .await;
    let won = json!({"event": "round-result", "message": "Alice wins round 3!"});
    assert_eq!(alice.recv().await, won);
    assert_eq!(bob.recv().await, won);

    let over = json!({"event": "game-over", "message": "Alice wins the game!"});
    assert_eq!(alice.recv().await, over);
    assert_eq!(bob.recv().await, over);
    assert!(state.arenas().is_empty());

    bob.send(&state, submit(&arena_id, "Bob", json!([0, 5, 10, 15]))).await;
    assert_eq!(
        bob.recv().await,
        json!({"event": "error", "message": "Arena not found"})
    );

    let record = wait_for_status(&store, &arena_id, ArenaStatus::Finished).await;
    assert_eq!(record.player1, "Alice");
    assert_eq!(record.player2.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn two_wrong_answers_replay_the_same_round() {
    let (state, _store) = setup(fast_timings()).await;
    let (mut alice, mut bob, arena_id) = ready_arena(&state).await;

    bob.send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    play_until_answers_open(&mut alice, &mut bob, "3, 2, 1...", "3x3", json!([2, 4, 5])).await;

    alice.send(&state, submit(&arena_id, "Alice", json!([0, 0, 0]))).await;
    assert_eq!(
        alice.recv().await,
        json!({"event": "wrong-answer", "message": "Incorrect answer!"})
    );
    bob.assert_no_message();

    bob.send(&state, submit(&arena_id, "Bob", json!([1, 1, 1]))).await;
    assert_eq!(
        bob.recv().await,
        json!({"event": "wrong-answer", "message": "Incorrect answer!"})
    );

    let retry = json!({
        "event": "round-retry",
        "message": "Both answers were incorrect! Retrying the round...",
    });
    let replay = json!({"event": "round-start", "gridSize": "3x3", "pattern": [2, 4, 5]});
    for client in [&mut alice, &mut bob] {
        assert_eq!(client.recv().await, retry);
        assert_eq!(client.recv().await, replay);
        assert_eq!(client.recv().await, json!({"event": "pattern-clear"}));
    }

    // Submissions were cleared: Alice may answer again.
    alice.send(&state, submit(&arena_id, "Alice", json!([2, 4, 5]))).await;
    let won = json!({"event": "round-result", "message": "Alice wins round 1!"});
    assert_eq!(alice.recv().await, won);
    assert_eq!(bob.recv().await, won);
}

#[tokio::test]
async fn duplicate_and_late_submissions_are_rejected_privately() {
    let timings = RoundTimings {
        result: Duration::from_secs(30),
        ..fast_timings()
    };
    let (state, _store) = setup(timings).await;
    let (mut alice, mut bob, arena_id) = ready_arena(&state).await;

    alice
        .send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    play_until_answers_open(&mut alice, &mut bob, "3, 2, 1...", "3x3", json!([2, 4, 5])).await;

    alice.send(&state, submit(&arena_id, "Alice", json!([0]))).await;
    alice.expect("wrong-answer").await;
    alice.send(&state, submit(&arena_id, "Alice", json!([2, 4, 5]))).await;
    assert_eq!(
        alice.recv().await,
        json!({
            "event": "duplicate-submission",
            "message": "You have already submitted your answer for this round.",
        })
    );
    bob.assert_no_message();

    bob.send(&state, submit(&arena_id, "Bob", json!([4, 5, 2]))).await;
    bob.expect("round-result").await;
    alice.expect("round-result").await;

    // The result is still on screen: a late answer is refused.
    let late = json!({
        "event": "submit-answer",
        "arenaId": arena_id,
        "username": "Alice",
        "answer": [2, 4, 5],
    });
    alice.send(&state, late).await;
    assert_eq!(
        alice.recv().await,
        json!({"event": "round-already-won", "message": "This round has already been won."})
    );
    bob.assert_no_message();
}

#[tokio::test]
async fn third_player_is_turned_away() {
    let (state, _store) = setup(fast_timings()).await;
    let (mut alice, mut bob, arena_id) = ready_arena(&state).await;

    let mut carol = TestClient::new();
    carol
        .send(
            &state,
            json!({"event": "join-arena", "username": "Carol", "arenaId": arena_id}),
        )
        .await;
    assert_eq!(
        carol.recv().await,
        json!({"event": "error", "message": "Only two players are allowed!"})
    );

    alice.assert_no_message();
    bob.assert_no_message();
    let handle = state.arenas().get(&arena_id).unwrap();
    assert_eq!(handle.lock().await.player_names(), vec!["Alice", "Bob"]);
}

#[tokio::test]
async fn join_errors_are_reported() {
    let (state, _store) = setup(fast_timings()).await;

    let mut alice = TestClient::new();
    alice
        .send(&state, json!({"event": "create-arena", "username": "Alice"}))
        .await;
    let arena_id = alice.expect("arena-created").await["arenaId"]
        .as_str()
        .unwrap()
        .to_string();

    let mut impostor = TestClient::new();
    impostor
        .send(
            &state,
            json!({"event": "join-arena", "username": "Alice", "arenaId": arena_id}),
        )
        .await;
    assert_eq!(
        impostor.recv().await,
        json!({"event": "error", "message": "Username already taken in this arena"})
    );

    impostor
        .send(
            &state,
            json!({"event": "join-arena", "username": "Bob", "arenaId": "arena_missing"}),
        )
        .await;
    assert_eq!(
        impostor.recv().await,
        json!({"event": "error", "message": "Arena not found"})
    );
    alice.assert_no_message();
}

#[tokio::test]
async fn start_requires_two_players_and_an_idle_arena() {
    let (state, _store) = setup(fast_timings()).await;

    let mut alice = TestClient::new();
    alice
        .send(&state, json!({"event": "create-arena", "username": "Alice"}))
        .await;
    let arena_id = alice.expect("arena-created").await["arenaId"]
        .as_str()
        .unwrap()
        .to_string();

    alice
        .send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    assert_eq!(
        alice.recv().await,
        json!({"event": "error", "message": "Waiting for a second player"})
    );

    let mut stranger = TestClient::new();
    stranger
        .send(&state, json!({"event": "start-game", "arenaId": "arena_missing"}))
        .await;
    assert_eq!(
        stranger.recv().await,
        json!({"event": "error", "message": "Arena not found"})
    );
}

#[tokio::test]
async fn answers_are_refused_before_the_pattern_clears() {
    let slow = RoundTimings {
        countdown: Duration::from_secs(30),
        ..fast_timings()
    };
    let (state, _store) = setup(slow).await;
    let (mut alice, mut bob, arena_id) = ready_arena(&state).await;

    alice
        .send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    alice.expect("countdown").await;
    bob.expect("countdown").await;

    alice
        .send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    assert_eq!(
        alice.recv().await,
        json!({"event": "error", "message": "Game already in progress"})
    );

    alice.send(&state, submit(&arena_id, "Alice", json!([2, 4, 5]))).await;
    assert_eq!(
        alice.recv().await,
        json!({"event": "error", "message": "Answers are not being accepted right now"})
    );
    bob.assert_no_message();
}

#[tokio::test]
async fn submissions_must_come_from_the_named_player() {
    let (state, _store) = setup(fast_timings()).await;
    let (mut alice, mut bob, arena_id) = ready_arena(&state).await;

    alice
        .send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    play_until_answers_open(&mut alice, &mut bob, "3, 2, 1...", "3x3", json!([2, 4, 5])).await;

    // Bob tries to answer on Alice's behalf.
    bob.send(&state, submit(&arena_id, "Alice", json!([2, 4, 5]))).await;
    assert_eq!(
        bob.recv().await,
        json!({"event": "error", "message": "You are not a player in this arena"})
    );
    alice.assert_no_message();
}

#[tokio::test]
async fn answer_timeout_replays_the_round() {
    let timings = RoundTimings {
        answer_timeout: Some(Duration::from_millis(30)),
        ..fast_timings()
    };
    let (state, _store) = setup(timings).await;
    let (mut alice, mut bob, arena_id) = ready_arena(&state).await;

    alice
        .send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    play_until_answers_open(&mut alice, &mut bob, "3, 2, 1...", "3x3", json!([2, 4, 5])).await;

    let timeout_notice = json!({
        "event": "round-retry",
        "message": "Time is up! Retrying the round...",
    });
    for client in [&mut alice, &mut bob] {
        assert_eq!(client.recv().await, timeout_notice);
        client.expect("round-start").await;
        client.expect("pattern-clear").await;
    }
}

#[tokio::test]
async fn disconnect_closes_the_arena_for_the_opponent() {
    let timings = RoundTimings {
        countdown: Duration::from_millis(200),
        ..fast_timings()
    };
    let (state, store) = setup(timings).await;
    let (mut alice, bob, arena_id) = ready_arena(&state).await;

    alice
        .send(&state, json!({"event": "start-game", "arenaId": arena_id}))
        .await;
    alice.expect("countdown").await;

    bob.session.close(&state).await;

    assert_eq!(
        alice.recv().await,
        json!({
            "event": "opponent-disconnected",
            "message": "Your opponent disconnected. The arena has been closed.",
        })
    );
    assert!(!state.arenas().contains(&arena_id));

    // Pending timers of the closed arena are dropped.
    tokio::time::sleep(Duration::from_millis(400)).await;
    alice.assert_no_message();

    let record = store.find_arena(arena_id).await.unwrap().unwrap();
    assert_eq!(record.status, ArenaStatus::Abandoned);
}

#[tokio::test]
async fn malformed_frames_keep_the_connection_usable() {
    let (state, _store) = setup(fast_timings()).await;
    let mut client = TestClient::new();

    client.session.handle_text(&state, "definitely not json").await;
    let response = client.expect("error").await;
    assert!(
        response["message"]
            .as_str()
            .unwrap()
            .starts_with("malformed message: ")
    );

    client.send(&state, json!({"event": "dance"})).await;
    client.expect("error").await;

    client.session.handle_binary();
    client.expect("error").await;

    client
        .send(&state, json!({"event": "create-arena", "username": "Alice"}))
        .await;
    client.expect("arena-created").await;
}

#[tokio::test]
async fn degraded_mode_blocks_new_arenas() {
    let state = AppState::new(AppConfig::default());
    let mut client = TestClient::new();

    client
        .send(&state, json!({"event": "create-arena", "username": "Alice"}))
        .await;
    assert_eq!(
        client.recv().await,
        json!({"event": "error", "message": "storage unavailable (degraded mode)"})
    );
    assert!(state.arenas().is_empty());
}
