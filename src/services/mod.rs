/// Arena lifecycle: create, join, start, submit and disconnect.
pub mod arena_service;
/// Typed messages pushed to player connections.
pub mod arena_events;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Timed steps of a running game.
pub mod round_sequencer;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
