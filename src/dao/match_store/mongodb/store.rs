use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoMatchDocument, doc_id, external_id_filter},
};
use crate::dao::{
    match_store::MatchStore,
    models::{MatchEntity, MatchEventEntity, MatchRecord, MatchSummaryEntity},
    storage::StorageResult,
};

const MATCH_COLLECTION_NAME: &str = "matches";
const EXTERNAL_ID_INDEX: &str = "match_youtube_id_unique";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed [`MatchStore`] implementation.
#[derive(Clone)]
pub struct MongoMatchStore {
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
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// The external video id is the natural key of a match, so the collection
    /// carries a unique index on it.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"youtube_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some(EXTERNAL_ID_INDEX.to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MATCH_COLLECTION_NAME,
                index: "youtube_id",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoMatchDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadMatch { id, source })?;

        document.map(MongoMatchDocument::into_entity).transpose()
    }

    async fn find_by_external_id(&self, youtube_id: String) -> MongoResult<Option<MatchEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(external_id_filter(&youtube_id))
            .await
            .map_err(|source| MongoDaoError::LoadByExternalId { youtube_id, source })?;

        document.map(MongoMatchDocument::into_entity).transpose()
    }

    async fn insert_match(
        &self,
        record: MatchRecord,
        events: Vec<MatchEventEntity>,
    ) -> MongoResult<Uuid> {
        let id = Uuid::new_v4();
        let youtube_id = record.youtube_id.clone();
        let document: MongoMatchDocument = MatchEntity::from_record(id, record, events).into();
        let collection = self.collection().await;

        match collection.insert_one(&document).await {
            Ok(_) => Ok(id),
            Err(source) if is_duplicate_key(&source) => {
                Err(MongoDaoError::DuplicateExternalId { youtube_id })
            }
            Err(source) => Err(MongoDaoError::InsertMatch { youtube_id, source }),
        }
    }

    async fn replace_match(&self, entity: MatchEntity) -> MongoResult<()> {
        let id = entity.id;
        let youtube_id = entity.youtube_id.clone();
        let document: MongoMatchDocument = entity.into();
        let collection = self.collection().await;

        match collection.replace_one(doc_id(id), &document).await {
            Ok(_) => Ok(()),
            Err(source) if is_duplicate_key(&source) => {
                Err(MongoDaoError::DuplicateExternalId { youtube_id })
            }
            Err(source) => Err(MongoDaoError::ReplaceMatch { id, source }),
        }
    }

    async fn list_matches(&self) -> MongoResult<Vec<MatchSummaryEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoMatchDocument> = collection
            .find(doc! {})
            .projection(doc! {"events": 0})
            .sort(doc! {"updated_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?;

        documents
            .into_iter()
            .map(MongoMatchDocument::into_summary)
            .collect()
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

impl MatchStore for MongoMatchStore {
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn find_by_external_id(
        &self,
        youtube_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_by_external_id(youtube_id)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_match(
        &self,
        record: MatchRecord,
        events: Vec<MatchEventEntity>,
    ) -> BoxFuture<'static, StorageResult<Uuid>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_match(record, events)
                .await
                .map_err(Into::into)
        })
    }

    fn replace_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_match(entity).await.map_err(Into::into) })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchSummaryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches().await.map_err(Into::into) })
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
