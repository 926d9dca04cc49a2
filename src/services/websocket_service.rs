use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::ClientMessage,
    error::ServiceError,
    services::{arena_events, arena_service},
    state::{PlayerConnection, SharedState},
};

/// Per-connection bookkeeping: the outbound handle and the arenas it sits in.
#[derive(Debug)]
pub struct PlayerSession {
    connection: PlayerConnection,
    arenas: HashSet<String>,
}

impl PlayerSession {
    /// Session writing to `tx`.
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            connection: PlayerConnection::new(tx),
            arenas: HashSet::new(),
        }
    }

    /// Outbound handle of this session.
    pub fn connection(&self) -> &PlayerConnection {
        &self.connection
    }

    /// Decode one text frame and dispatch it.
    ///
    /// Failures are reported to this connection only; the connection stays open.
    pub async fn handle_text(&mut self, state: &SharedState, text: &str) {
        let result = match ClientMessage::from_json_str(text) {
            Ok(message) => {
                debug!(
                    connection = %self.connection.id,
                    event = message.event_name(),
                    "received message"
                );
                self.dispatch(state, message).await
            }
            Err(err) => Err(err.into()),
        };

        if let Err(err) = result {
            self.report(err);
        }
    }

    /// Report a binary frame, which this protocol never uses.
    pub fn handle_binary(&self) {
        self.report(ServiceError::MalformedMessage(
            "binary frames are not supported".into(),
        ));
    }

    /// Tear down every arena this session was part of.
    pub async fn close(self, state: &SharedState) {
        arena_service::handle_disconnect(state, self.connection.id, &self.arenas).await;
    }

    async fn dispatch(
        &mut self,
        state: &SharedState,
        message: ClientMessage,
    ) -> Result<(), ServiceError> {
        match message {
            ClientMessage::CreateArena(payload) => {
                let arena_id =
                    arena_service::create_arena(state, &self.connection, payload.username).await?;
                self.arenas.insert(arena_id);
            }
            ClientMessage::JoinArena(payload) => {
                let arena_id = payload.arena_id.clone();
                arena_service::join_arena(state, &self.connection, payload).await?;
                self.arenas.insert(arena_id);
            }
            ClientMessage::StartGame(payload) => {
                arena_service::start_game(state, &self.connection, payload).await?;
            }
            ClientMessage::SubmitAnswer(payload) => {
                arena_service::submit_answer(state, &self.connection, payload).await?;
            }
        }
        Ok(())
    }

    fn report(&self, err: ServiceError) {
        warn!(connection = %self.connection.id, error = %err, "rejected client message");
        arena_events::send_to(&self.connection, &err.to_server_message());
    }
}

/// Handle the full lifecycle for an individual player WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut session = PlayerSession::new(outbound_tx.clone());
    let connection_id = session.connection().id;
    info!(connection = %connection_id, "player connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => session.handle_text(&state, text.as_str()).await,
            Ok(Message::Binary(_)) => session.handle_binary(),
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Pong(_)) => {}
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Err(err) => {
                warn!(connection = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    session.close(&state).await;
    info!(connection = %connection_id, "player disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
