//! Process-local match store used for tests and ephemeral runs.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    match_store::MatchStore,
    models::{MatchEntity, MatchEventEntity, MatchRecord, MatchSummaryEntity},
    storage::{StorageError, StorageResult},
};

#[derive(Clone, Default)]
pub struct InMemoryMatchStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    matches: DashMap<Uuid, MatchEntity>,
    /// Unique index from external video id to match id.
    by_external_id: DashMap<String, Uuid>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matches.
    pub fn len(&self) -> usize {
        self.inner.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.matches.is_empty()
    }
}

impl MatchStore for InMemoryMatchStore {
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .matches
                .get(&id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn find_by_external_id(
        &self,
        youtube_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(id) = store
                .inner
                .by_external_id
                .get(&youtube_id)
                .map(|entry| *entry.value())
            else {
                return Ok(None);
            };
            Ok(store
                .inner
                .matches
                .get(&id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn insert_match(
        &self,
        record: MatchRecord,
        events: Vec<MatchEventEntity>,
    ) -> BoxFuture<'static, StorageResult<Uuid>> {
        let store = self.clone();
        Box::pin(async move {
            let id = Uuid::new_v4();
            match store.inner.by_external_id.entry(record.youtube_id.clone()) {
                Entry::Occupied(_) => Err(StorageError::conflict(format!(
                    "a match for video `{}` already exists",
                    record.youtube_id
                ))),
                Entry::Vacant(slot) => {
                    store
                        .inner
                        .matches
                        .insert(id, MatchEntity::from_record(id, record, events));
                    slot.insert(id);
                    Ok(id)
                }
            }
        })
    }

    fn replace_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(owner) = store.inner.by_external_id.get(&entity.youtube_id)
                && *owner.value() != entity.id
            {
                return Err(StorageError::conflict(format!(
                    "video `{}` belongs to another match",
                    entity.youtube_id
                )));
            }

            let previous = store.inner.matches.insert(entity.id, entity.clone());
            if let Some(previous) = previous
                && previous.youtube_id != entity.youtube_id
            {
                store.inner.by_external_id.remove(&previous.youtube_id);
            }
            store
                .inner
                .by_external_id
                .insert(entity.youtube_id, entity.id);
            Ok(())
        })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchSummaryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut summaries = store
                .inner
                .matches
                .iter()
                .map(|entry| MatchSummaryEntity::from(entry.value().clone()))
                .collect::<Vec<_>>();
            summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(summaries)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
