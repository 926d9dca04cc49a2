//! Pattern arena binary entrypoint wiring the WebSocket game server, health
//! endpoint, documentation and arena storage.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, http::HeaderValue};
use pattern_arena_back::{
    config::{AppConfig, StorageBackend},
    dao::arena_store::memory::InMemoryArenaStore,
    routes,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let port = config.port;
    let cors = cors_layer(&config);
    let storage = config.storage;

    let app_state = AppState::new(config);
    install_storage(&app_state, storage).await?;
    tokio::spawn(log_degraded_changes(app_state.clone()));

    let app = build_router(app_state, cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the configured arena store, supervising networked backends in the background.
async fn install_storage(state: &SharedState, backend: StorageBackend) -> anyhow::Result<()> {
    match backend {
        StorageBackend::Memory => {
            info!("using in-memory arena storage");
            state
                .set_arena_store(Arc::new(InMemoryArenaStore::new()))
                .await;
        }
        StorageBackend::Mongo => spawn_mongo_supervisor(state)?,
        StorageBackend::Couch => spawn_couch_supervisor(state)?,
    }
    Ok(())
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: &SharedState) -> anyhow::Result<()> {
    use pattern_arena_back::{
        dao::{
            arena_store::{
                ArenaStore,
                mongodb::{MongoArenaStore, MongoConfig},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    info!("using MongoDB arena storage");
    tokio::spawn(storage_supervisor::run(state.clone(), || async {
        let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
        let store = MongoArenaStore::connect(config)
            .await
            .map_err(StorageError::from)?;
        Ok(Arc::new(store) as Arc<dyn ArenaStore>)
    }));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo_supervisor(_state: &SharedState) -> anyhow::Result<()> {
    anyhow::bail!("MongoDB storage requested but the `mongo-store` feature is disabled")
}

#[cfg(feature = "couch-store")]
fn spawn_couch_supervisor(state: &SharedState) -> anyhow::Result<()> {
    use pattern_arena_back::{
        dao::{
            arena_store::{
                ArenaStore,
                couchdb::{CouchArenaStore, CouchConfig},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    info!("using CouchDB arena storage");
    tokio::spawn(storage_supervisor::run(state.clone(), || async {
        let config = CouchConfig::from_env().map_err(StorageError::from)?;
        let store = CouchArenaStore::connect(config)
            .await
            .map_err(StorageError::from)?;
        Ok(Arc::new(store) as Arc<dyn ArenaStore>)
    }));
    Ok(())
}

#[cfg(not(feature = "couch-store"))]
fn spawn_couch_supervisor(_state: &SharedState) -> anyhow::Result<()> {
    anyhow::bail!("CouchDB storage requested but the `couch-store` feature is disabled")
}

/// Log every transition in and out of degraded mode.
async fn log_degraded_changes(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        if *watcher.borrow_and_update() {
            warn!("arena storage unavailable; create and join are disabled");
        } else {
            info!("arena storage available");
        }
    }
}

/// CORS policy mirroring the WebSocket origin allow-list.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(origin = %origin, error = %err, "ignoring invalid origin in allow-list");
                None
            }
        })
        .collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState, cors: CorsLayer) -> Router<()> {
    routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
