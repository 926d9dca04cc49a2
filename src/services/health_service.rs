use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report storage health together with the number of live arenas.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_arena_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let arenas = state.arenas().len();
    if state.is_degraded() {
        HealthResponse::degraded(arenas)
    } else {
        HealthResponse::ok(arenas)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::arena_store::memory::InMemoryArenaStore, state::AppState};

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await, HealthResponse::degraded(0));

        state
            .set_arena_store(Arc::new(InMemoryArenaStore::new()))
            .await;
        state.arenas().get_or_create("arena_a");
        assert_eq!(health_status(&state).await, HealthResponse::ok(1));
    }
}
