#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{ArenaEntity, ArenaStatus, SeatClaim};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for arena records.
pub trait ArenaStore: Send + Sync {
    /// Persist a freshly created arena.
    fn create_arena(&self, arena: ArenaEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look an arena record up by id.
    fn find_arena(&self, id: String) -> BoxFuture<'static, StorageResult<Option<ArenaEntity>>>;
    /// Atomically record `username` as second player if the seat is still free.
    fn claim_second_seat(
        &self,
        id: String,
        username: String,
    ) -> BoxFuture<'static, StorageResult<SeatClaim>>;
    /// Update the lifecycle status of an arena.
    fn update_status(&self, id: String, status: ArenaStatus)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap liveness probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
