use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{
    Client, Collection, Database,
    bson::{Bson, DateTime, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoArenaDocument, doc_id},
};
use crate::dao::{
    arena_store::ArenaStore,
    models::{ArenaEntity, ArenaStatus, SeatClaim},
    storage::StorageResult,
};

const ARENA_COLLECTION_NAME: &str = "arenas";
const STATUS_INDEX: &str = "arena_status_idx";

#[derive(Clone)]
pub struct MongoArenaStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::Ping { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoArenaStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        // Supports sweeping finished or abandoned arenas by age.
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"status": 1, "updated_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some(STATUS_INDEX.to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::Index {
                name: STATUS_INDEX,
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoArenaDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoArenaDocument>(ARENA_COLLECTION_NAME)
    }

    async fn create_arena(&self, arena: ArenaEntity) -> MongoResult<()> {
        let arena_id = arena.id.clone();
        let document: MongoArenaDocument = arena.into();
        self.collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::from_insert(arena_id, source))?;
        Ok(())
    }

    async fn find_arena(&self, id: String) -> MongoResult<Option<ArenaEntity>> {
        let document = self
            .collection()
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Query {
                arena_id: id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn claim_second_seat(&self, id: String, username: String) -> MongoResult<SeatClaim> {
        let collection = self.collection().await;
        // Matching on an empty second seat turns the update into a compare-and-set.
        let filter = doc! { "_id": &id, "player2": Bson::Null };
        let update = doc! {
            "$set": {
                "player2": &username,
                "status": ArenaStatus::Ready.as_str(),
                "updated_at": DateTime::now(),
            }
        };

        let claimed = collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Update {
                arena_id: id.clone(),
                source,
            })?;

        if let Some(document) = claimed {
            return Ok(SeatClaim::Claimed(document.into()));
        }

        match self.find_arena(id).await? {
            Some(_) => Ok(SeatClaim::AlreadyTaken),
            None => Ok(SeatClaim::Missing),
        }
    }

    async fn update_status(&self, id: String, status: ArenaStatus) -> MongoResult<()> {
        let update = doc! {
            "$set": {
                "status": status.as_str(),
                "updated_at": DateTime::now(),
            }
        };
        self.collection()
            .await
            .update_one(doc_id(&id), update)
            .await
            .map_err(|source| MongoDaoError::Update {
                arena_id: id,
                source,
            })?;
        Ok(())
    }
}

impl ArenaStore for MongoArenaStore {
    fn create_arena(&self, arena: ArenaEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_arena(arena).await.map_err(Into::into) })
    }

    fn find_arena(&self, id: String) -> BoxFuture<'static, StorageResult<Option<ArenaEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_arena(id).await.map_err(Into::into) })
    }

    fn claim_second_seat(
        &self,
        id: String,
        username: String,
    ) -> BoxFuture<'static, StorageResult<SeatClaim>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .claim_second_seat(id, username)
                .await
                .map_err(Into::into)
        })
    }

    fn update_status(
        &self,
        id: String,
        status: ArenaStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_status(id, status).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
