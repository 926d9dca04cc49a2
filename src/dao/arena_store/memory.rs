use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{self, BoxFuture};

use crate::dao::{
    arena_store::ArenaStore,
    models::{ArenaEntity, ArenaStatus, SeatClaim},
    storage::StorageResult,
};

/// Process-local arena store. Records vanish with the process.
#[derive(Clone, Default)]
pub struct InMemoryArenaStore {
    arenas: Arc<DashMap<String, ArenaEntity>>,
}

impl InMemoryArenaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArenaStore for InMemoryArenaStore {
    fn create_arena(&self, arena: ArenaEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.arenas.insert(arena.id.clone(), arena);
        Box::pin(future::ready(Ok(())))
    }

    fn find_arena(&self, id: String) -> BoxFuture<'static, StorageResult<Option<ArenaEntity>>> {
        let found = self.arenas.get(&id).map(|entry| entry.value().clone());
        Box::pin(future::ready(Ok(found)))
    }

    fn claim_second_seat(
        &self,
        id: String,
        username: String,
    ) -> BoxFuture<'static, StorageResult<SeatClaim>> {
        // The entry guard locks the shard, making check-and-set atomic.
        let claim = match self.arenas.entry(id) {
            Entry::Vacant(_) => SeatClaim::Missing,
            Entry::Occupied(mut entry) => {
                if entry.get().player2.is_some() {
                    SeatClaim::AlreadyTaken
                } else {
                    let updated = entry.get().clone().with_second_player(username);
                    entry.insert(updated.clone());
                    SeatClaim::Claimed(updated)
                }
            }
        };
        Box::pin(future::ready(Ok(claim)))
    }

    fn update_status(
        &self,
        id: String,
        status: ArenaStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        if let Some(mut entry) = self.arenas.get_mut(&id) {
            entry.status = status;
            entry.updated_at = SystemTime::now();
        }
        Box::pin(future::ready(Ok(())))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }
}
