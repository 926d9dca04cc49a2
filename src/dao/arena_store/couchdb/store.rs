use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use crate::dao::{
    arena_store::ArenaStore,
    models::{ArenaEntity, ArenaStatus, SeatClaim},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchArenaDocument, arena_doc_id},
};

/// Revision conflicts tolerated before an update gives up.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// Result of a revision-checked document write.
enum PutOutcome {
    Saved,
    Conflict,
}

/// Arena store backed by one CouchDB database, one document per arena.
///
/// Conditional updates rely on CouchDB revisions: a write carrying a stale
/// `_rev` is refused with `409`, and the store re-reads before trying again.
#[derive(Clone)]
pub struct CouchArenaStore {
    client: Client,
    database_url: Arc<str>,
    credentials: Option<Arc<(String, String)>>,
}

impl CouchArenaStore {
    /// Connect to CouchDB, creating the database when it does not exist yet.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            database_url: Arc::from(format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.database
            )),
            credentials: config.credentials.map(Arc::new),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn url(&self, doc_id: Option<&str>) -> String {
        match doc_id {
            Some(doc_id) => format!("{}/{doc_id}", self.database_url),
            None => self.database_url.to_string(),
        }
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credentials.as_deref() {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    async fn send(
        &self,
        method: Method,
        doc_id: Option<&str>,
        body: Option<&CouchArenaDocument>,
    ) -> CouchResult<Response> {
        let url = self.url(doc_id);
        let mut builder = self.with_auth(self.client.request(method, &url));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport { path: url, source })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let status = self.send(Method::GET, None, None).await?.status();
        if status == StatusCode::NOT_FOUND {
            let created = self.send(Method::PUT, None, None).await?.status();
            // 412: someone else created it in between.
            if created.is_success() || created == StatusCode::PRECONDITION_FAILED {
                return Ok(());
            }
            return Err(CouchDaoError::UnexpectedStatus {
                path: self.url(None),
                status: created,
            });
        }
        if status.is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::UnexpectedStatus {
                path: self.url(None),
                status,
            })
        }
    }

    async fn load(&self, doc_id: &str) -> CouchResult<Option<CouchArenaDocument>> {
        let response = self.send(Method::GET, Some(doc_id), None).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchArenaDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::Decode {
                    path: doc_id.to_string(),
                    source,
                }),
            status => Err(CouchDaoError::UnexpectedStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    async fn save(&self, document: &CouchArenaDocument) -> CouchResult<PutOutcome> {
        let response = self
            .send(Method::PUT, Some(&document.id), Some(document))
            .await?;
        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Saved),
            status => Err(CouchDaoError::UnexpectedStatus {
                path: document.id.clone(),
                status,
            }),
        }
    }

    /// Re-read `doc_id` and apply `edit` until the write lands on the latest revision.
    ///
    /// `edit` returns `Err` to stop without writing. A missing document is
    /// reported as `Ok(None)`.
    async fn update_with_retry<T, F>(&self, doc_id: &str, mut edit: F) -> CouchResult<Option<T>>
    where
        F: FnMut(CouchArenaDocument) -> Result<(CouchArenaDocument, T), T>,
    {
        for _ in 0..MAX_CONFLICT_RETRIES {
            let Some(current) = self.load(doc_id).await? else {
                return Ok(None);
            };
            let (updated, outcome) = match edit(current) {
                Ok(edited) => edited,
                Err(outcome) => return Ok(Some(outcome)),
            };
            if let PutOutcome::Saved = self.save(&updated).await? {
                return Ok(Some(outcome));
            }
        }

        Err(CouchDaoError::Conflict {
            doc_id: doc_id.to_string(),
            attempts: MAX_CONFLICT_RETRIES,
        })
    }

    async fn claim_second_seat(&self, id: &str, username: &str) -> CouchResult<SeatClaim> {
        let claim = self
            .update_with_retry(&arena_doc_id(id), |current| {
                if current.arena.player2.is_some() {
                    return Err(SeatClaim::AlreadyTaken);
                }
                let rev = current.rev.clone();
                let claimed = current.into_entity().with_second_player(username);
                let document = CouchArenaDocument::from((claimed.clone(), rev));
                Ok((document, SeatClaim::Claimed(claimed)))
            })
            .await?;
        Ok(claim.unwrap_or(SeatClaim::Missing))
    }

    async fn update_status(&self, id: &str, status: ArenaStatus) -> CouchResult<()> {
        self.update_with_retry(&arena_doc_id(id), |mut current| {
            current.arena.status = status;
            current.arena.updated_at = SystemTime::now();
            Ok((current, ()))
        })
        .await?;
        Ok(())
    }
}

impl ArenaStore for CouchArenaStore {
    fn create_arena(&self, arena: ArenaEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let document = CouchArenaDocument::from((arena, None));
            match store.save(&document).await? {
                PutOutcome::Saved => Ok(()),
                PutOutcome::Conflict => Err(CouchDaoError::AlreadyExists {
                    doc_id: document.id,
                }
                .into()),
            }
        })
    }

    fn find_arena(&self, id: String) -> BoxFuture<'static, StorageResult<Option<ArenaEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store.load(&arena_doc_id(&id)).await?;
            Ok(document.map(CouchArenaDocument::into_entity))
        })
    }

    fn claim_second_seat(
        &self,
        id: String,
        username: String,
    ) -> BoxFuture<'static, StorageResult<SeatClaim>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .claim_second_seat(&id, &username)
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
        Box::pin(async move { store.update_status(&id, status).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let status = store.send(Method::HEAD, None, None).await?.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::UnexpectedStatus {
                    path: store.url(None),
                    status,
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
