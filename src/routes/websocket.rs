use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode, header::ORIGIN},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::warn;

use crate::{services::websocket_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "arenas",
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 403, description = "Origin not in the allow-list")
    )
)]
/// Upgrade the HTTP connection into a player WebSocket session.
///
/// Frames are JSON objects tagged by `event`: see `ClientMessage` and `ServerMessage`.
pub async fn ws_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    if !state.config().is_origin_allowed(origin) {
        warn!(origin = ?origin, "rejecting websocket upgrade from disallowed origin");
        return StatusCode::FORBIDDEN.into_response();
    }

    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, socket))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
