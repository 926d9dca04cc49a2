pub mod arena;
pub mod catalog;
pub mod registry;
pub mod state_machine;

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::{RwLock, mpsc, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::arena_store::ArenaStore, error::ServiceError,
    state::catalog::RoundCatalog,
};

use self::registry::ArenaRegistry;

pub type SharedState = Arc<AppState>;

#[derive(Debug, Clone)]
/// Handle used to push messages to a connected player.
pub struct PlayerConnection {
    pub id: Uuid,
    pub tx: mpsc::UnboundedSender<Message>,
}

impl PlayerConnection {
    /// Wrap an outbound channel under a fresh connection identifier.
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }
}

/// Central application state storing live arenas and the storage handle.
pub struct AppState {
    config: Arc<AppConfig>,
    arena_store: RwLock<Option<Arc<dyn ArenaStore>>>,
    arenas: ArenaRegistry,
    catalog: RoundCatalog,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config: Arc::new(config),
            arena_store: RwLock::new(None),
            arenas: ArenaRegistry::new(),
            catalog: RoundCatalog::new(),
            degraded: degraded_tx,
        })
    }

    /// Build a state with `store` already installed.
    pub async fn with_store(config: AppConfig, store: Arc<dyn ArenaStore>) -> SharedState {
        let state = Self::new(config);
        state.set_arena_store(store).await;
        state
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Registry of live arenas keyed by their identifier.
    pub fn arenas(&self) -> &ArenaRegistry {
        &self.arenas
    }

    /// Rounds every game plays through.
    pub fn catalog(&self) -> &RoundCatalog {
        &self.catalog
    }

    /// Obtain a handle to the current arena store, if one is installed.
    pub async fn arena_store(&self) -> Option<Arc<dyn ArenaStore>> {
        let guard = self.arena_store.read().await;
        guard.as_ref().cloned()
    }

    /// Arena store or [`ServiceError::Degraded`] when storage is down.
    pub async fn require_arena_store(&self) -> Result<Arc<dyn ArenaStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.arena_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new arena store implementation and leave degraded mode.
    pub async fn set_arena_store(&self, store: Arc<dyn ArenaStore>) {
        {
            let mut guard = self.arena_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current arena store and enter degraded mode.
    pub async fn clear_arena_store(&self) {
        {
            let mut guard = self.arena_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
