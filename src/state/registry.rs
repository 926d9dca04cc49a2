use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::state::arena::Arena;

/// Shared handle to one arena; the mutex serialises every mutation of that arena.
pub type ArenaHandle = Arc<Mutex<Arena>>;

/// In-memory mapping from arena identifier to live arena state.
///
/// Entries are only touched by handlers working on that id, so the sharded
/// map never sees cross-arena contention. Guards must not be held across
/// `.await`: callers clone the handle out and lock it afterwards.
#[derive(Default)]
pub struct ArenaRegistry {
    arenas: DashMap<String, ArenaHandle>,
}

impl ArenaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the handle for `id`.
    pub fn get(&self, id: &str) -> Option<ArenaHandle> {
        self.arenas.get(id).map(|entry| entry.value().clone())
    }

    /// Fetch the handle for `id`, inserting an empty arena when absent.
    pub fn get_or_create(&self, id: &str) -> ArenaHandle {
        self.arenas
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Arena::new(id))))
            .value()
            .clone()
    }

    /// Whether an arena with this id is live.
    pub fn contains(&self, id: &str) -> bool {
        self.arenas.contains_key(id)
    }

    /// Remove `id` only if it still maps to `handle`.
    pub fn remove(&self, id: &str, handle: &ArenaHandle) -> bool {
        self.arenas
            .remove_if(id, |_, current| Arc::ptr_eq(current, handle))
            .is_some()
    }

    /// Number of live arenas.
    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    /// Whether no arena is live.
    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }
}
