use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the pattern arena server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::CreateArenaPayload,
            crate::dto::ws::JoinArenaPayload,
            crate::dto::ws::StartGamePayload,
            crate::dto::ws::SubmitAnswerPayload,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "arenas", description = "WebSocket protocol spoken by players"),
    )
)]
pub struct ApiDoc;
