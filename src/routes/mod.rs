use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub mod health;
pub mod websocket;

/// Swagger UI mount point.
const DOCS_PATH: &str = "/docs";
/// Where the generated OpenAPI document is served.
const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Assemble every HTTP route with the shared state attached.
pub fn router(state: SharedState) -> Router<()> {
    let docs: Router<SharedState> = SwaggerUi::new(DOCS_PATH)
        .url(OPENAPI_PATH, ApiDoc::openapi())
        .into();

    Router::new()
        .merge(health::router())
        .merge(websocket::router())
        .merge(docs)
        .with_state(state)
}
