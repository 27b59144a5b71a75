//! CouchDB match store.
//!
//! One document per video, keyed by `video::<youtube_id>` so the server's id
//! uniqueness rejects a second match for the same video. Lookups by internal
//! match id go through the `match-id` Mango index.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{from_value, json};
use uuid::Uuid;

use crate::dao::{
    match_store::MatchStore,
    models::{MatchEntity, MatchEventEntity, MatchRecord, MatchSummaryEntity},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchMatchDocument, END_SUFFIX, FindResponse, MATCH_ID_INDEX,
        VIDEO_PREFIX, video_doc_id,
    },
};

enum PutOutcome {
    Written,
    Conflict,
}

/// CouchDB-backed [`MatchStore`] speaking the plain HTTP document API.
#[derive(Clone)]
pub struct CouchMatchStore {
    client: Client,
    config: Arc<CouchConfig>,
}

impl CouchMatchStore {
    /// Connect, create the database when missing and index `match_id`.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            config: Arc::new(config),
        };
        store.ensure_database().await?;
        store.ensure_match_id_index().await?;
        Ok(store)
    }

    /// `{server}/{database}/{segments..}` with every segment percent-encoded.
    fn url(&self, segments: &[&str]) -> CouchResult<Url> {
        let mut url = self.config.server.clone();
        url.path_segments_mut()
            .map_err(|()| CouchDaoError::InvalidServerUrl {
                url: self.config.server.to_string(),
                reason: "not a hierarchical URL".into(),
            })?
            .pop_if_empty()
            .push(&self.config.database)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> CouchResult<reqwest::RequestBuilder> {
        let builder = self.client.request(method, self.url(segments)?);
        Ok(match &self.config.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        })
    }

    async fn send(
        &self,
        path: &str,
        builder: reqwest::RequestBuilder,
    ) -> CouchResult<reqwest::Response> {
        builder.send().await.map_err(|source| CouchDaoError::Request {
            path: path.to_owned(),
            source,
        })
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> CouchResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|source| CouchDaoError::Request {
                path: path.to_owned(),
                source,
            })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.config.database.as_str();
        let response = self
            .send(database, self.request(Method::GET, &[])?)
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = self.send(database, self.request(Method::PUT, &[])?).await?;
                match created.status() {
                    // 412: created concurrently by another instance
                    status if status.is_success() || status == StatusCode::PRECONDITION_FAILED => {
                        Ok(())
                    }
                    status => Err(CouchDaoError::Status {
                        path: database.to_owned(),
                        status,
                    }),
                }
            }
            status => Err(CouchDaoError::Status {
                path: database.to_owned(),
                status,
            }),
        }
    }

    async fn ensure_match_id_index(&self) -> CouchResult<()> {
        let body = json!({
            "index": { "fields": ["match_id"] },
            "name": MATCH_ID_INDEX,
            "type": "json",
        });
        let response = self
            .send("_index", self.request(Method::POST, &["_index"])?.json(&body))
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::Status {
                path: "_index".into(),
                status: response.status(),
            })
        }
    }

    async fn get_document<T: DeserializeOwned>(&self, doc_id: &str) -> CouchResult<Option<T>> {
        let response = self
            .send(doc_id, self.request(Method::GET, &[doc_id])?)
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Self::decode(doc_id, response).await.map(Some),
            status => Err(CouchDaoError::Status {
                path: doc_id.to_owned(),
                status,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .send(doc_id, self.request(Method::PUT, &[doc_id])?.json(document))
            .await?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Written),
            status => Err(CouchDaoError::Status {
                path: doc_id.to_owned(),
                status,
            }),
        }
    }

    async fn list_video_documents(&self) -> CouchResult<Vec<CouchMatchDocument>> {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_owned()),
            ("startkey", format!("\"{VIDEO_PREFIX}\"")),
            ("endkey", format!("\"{VIDEO_PREFIX}{END_SUFFIX}\"")),
        ];

        let response = self
            .send(ALL_DOCS, self.request(Method::GET, &[ALL_DOCS])?.query(&query))
            .await?;
        if !response.status().is_success() {
            return Err(CouchDaoError::Status {
                path: ALL_DOCS.into(),
                status: response.status(),
            });
        }

        let payload: AllDocsResponse = Self::decode(ALL_DOCS, response).await?;
        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc.map(|doc| (row.id, doc)))
            .map(|(path, doc)| from_value(doc).map_err(|source| CouchDaoError::Malformed { path, source }))
            .collect()
    }

    async fn load_match(&self, id: Uuid) -> CouchResult<Option<MatchEntity>> {
        const FIND: &str = "_find";
        let body = json!({
            "selector": { "match_id": id },
            "limit": 1,
        });
        let response = self
            .send(FIND, self.request(Method::POST, &[FIND])?.json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(CouchDaoError::Status {
                path: FIND.into(),
                status: response.status(),
            });
        }

        let found: FindResponse = Self::decode(FIND, response).await?;
        Ok(found.docs.into_iter().next().map(MatchEntity::from))
    }

    async fn load_by_external_id(&self, youtube_id: &str) -> CouchResult<Option<MatchEntity>> {
        Ok(self
            .get_document::<CouchMatchDocument>(&video_doc_id(youtube_id))
            .await?
            .map(MatchEntity::from))
    }

    /// Create the video document; CouchDB answers 409 when it already exists.
    async fn insert_match(
        &self,
        record: MatchRecord,
        events: Vec<MatchEventEntity>,
    ) -> CouchResult<Uuid> {
        let id = Uuid::new_v4();
        let youtube_id = record.youtube_id.clone();
        let document = CouchMatchDocument::new(MatchEntity::from_record(id, record, events), None);

        match self.put_document(&document.id, &document).await? {
            PutOutcome::Written => Ok(id),
            PutOutcome::Conflict => Err(CouchDaoError::DuplicateExternalId { youtube_id }),
        }
    }

    async fn replace_match(&self, entity: MatchEntity) -> CouchResult<()> {
        let doc_id = video_doc_id(&entity.youtube_id);
        let rev = self
            .get_document::<CouchMatchDocument>(&doc_id)
            .await?
            .and_then(|existing| existing.rev);
        let document = CouchMatchDocument::new(entity, rev);
        match self.put_document(&doc_id, &document).await? {
            PutOutcome::Written => Ok(()),
            PutOutcome::Conflict => Err(CouchDaoError::RevisionConflict { path: doc_id }),
        }
    }

    async fn ping(&self) -> CouchResult<()> {
        let database = self.config.database.as_str();
        let response = self
            .send(database, self.request(Method::GET, &[])?)
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::Status {
                path: database.to_owned(),
                status: response.status(),
            })
        }
    }
}

impl MatchStore for CouchMatchStore {
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_match(id).await.map_err(Into::into) })
    }

    fn find_by_external_id(
        &self,
        youtube_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_by_external_id(&youtube_id)
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
        Box::pin(async move {
            let mut summaries: Vec<MatchSummaryEntity> = store
                .list_video_documents()
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(summaries)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
