//! Persistence gateway between the tracking session and the match store.
//!
//! Matches are keyed by their external video id: saving the same video twice
//! updates the stored document instead of creating a second one.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::{MatchEntity, MatchEventEntity, MatchRecord, MatchSummaryEntity, tag_events},
    error::ServiceError,
    state::SharedState,
};

/// First stored match carrying `youtube_id`, if any, with its events tagged.
pub async fn find_by_external_id(
    state: &SharedState,
    youtube_id: &str,
) -> Result<Option<MatchEntity>, ServiceError> {
    let store = state.require_match_store().await?;
    let found = store.find_by_external_id(youtube_id.to_string()).await?;
    Ok(found.map(with_tagged_events))
}

fn with_tagged_events(mut entity: MatchEntity) -> MatchEntity {
    entity.events = tag_events(entity.id, std::mem::take(&mut entity.events));
    entity
}

/// Insert or update the match identified by `record.youtube_id` and return its id.
///
/// Embedded events are replaced wholesale and tagged with the match id.
pub async fn upsert(
    state: &SharedState,
    record: MatchRecord,
    events: Vec<MatchEventEntity>,
) -> Result<Uuid, ServiceError> {
    let store = state.require_match_store().await?;
    let youtube_id = record.youtube_id.clone();
    let lock = state.upsert_lock(&youtube_id);
    let _guard = lock.lock().await;

    if let Some(mut existing) = store.find_by_external_id(youtube_id.clone()).await? {
        existing.apply_record(record, events);
        let id = existing.id;
        store.replace_match(existing).await?;
        debug!(%id, youtube_id, "updated stored match");
        return Ok(id);
    }

    match store.insert_match(record.clone(), events.clone()).await {
        Ok(id) => {
            info!(%id, youtube_id, "created match");
            Ok(id)
        }
        Err(err) if err.is_conflict() => {
            // Another process inserted the same video first.
            let mut existing = store
                .find_by_external_id(youtube_id.clone())
                .await?
                .ok_or_else(|| ServiceError::Unavailable(err))?;
            existing.apply_record(record, events);
            let id = existing.id;
            store.replace_match(existing).await?;
            info!(%id, youtube_id, "insert lost a race; updated existing match");
            Ok(id)
        }
        Err(err) => Err(err.into()),
    }
}

/// Events embedded in match `match_id`, each tagged with that id.
pub async fn events_for(
    state: &SharedState,
    match_id: Uuid,
) -> Result<Vec<MatchEventEntity>, ServiceError> {
    Ok(get_match(state, match_id).await?.events)
}

/// Stored match by internal id. Embedded events are re-tagged on the way out,
/// so documents written without the tag read the same as fresh ones.
pub async fn get_match(state: &SharedState, match_id: Uuid) -> Result<MatchEntity, ServiceError> {
    let store = state.require_match_store().await?;
    store
        .find_match(match_id)
        .await?
        .map(with_tagged_events)
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}` does not exist")))
}

/// Summaries of every stored match, most recently updated first.
pub async fn list_matches(state: &SharedState) -> Result<Vec<MatchSummaryEntity>, ServiceError> {
    let store = state.require_match_store().await?;
    Ok(store.list_matches().await?)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::SystemTime,
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            draft_store::MemoryDraftStore,
            match_store::{MatchStore, memory::InMemoryMatchStore},
            models::{PlayerEntity, TeamSideEntity},
            storage::StorageResult,
        },
        state::AppState,
    };

    async fn state_with_store() -> (SharedState, InMemoryMatchStore) {
        let store = InMemoryMatchStore::new();
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryDraftStore::new()));
        state.install_match_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn record(youtube_id: &str, home: &str) -> MatchRecord {
        MatchRecord {
            youtube_id: youtube_id.into(),
            home_team_name: home.into(),
            away_team_name: "United".into(),
            date: SystemTime::now(),
            players: vec![PlayerEntity {
                id: Uuid::new_v4(),
                name: "Ada".into(),
                number: 10,
                team: TeamSideEntity::Home,
            }],
        }
    }

    fn event(label: &str, timestamp: f64) -> MatchEventEntity {
        MatchEventEntity {
            id: Uuid::new_v4(),
            match_id: None,
            timestamp,
            time_string: crate::state::timecode::format(timestamp),
            player_id: Uuid::new_v4(),
            player_name: "Ada".into(),
            player_number: 10,
            event_type: label.into(),
            additional_data: None,
        }
    }

    #[tokio::test]
    async fn first_upsert_inserts_and_tags_events() {
        let (state, store) = state_with_store().await;

        let id = upsert(&state, record("abc", "Rovers"), vec![event("Goal", 125.4)])
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let events = events_for(&state, id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].match_id, Some(id));
    }

    #[tokio::test]
    async fn repeated_upserts_update_in_place() {
        let (state, store) = state_with_store().await;

        let first = upsert(&state, record("abc", "Rovers"), vec![event("Goal", 1.0)])
            .await
            .unwrap();
        let second_events = vec![event("Pass", 2.0), event("Assist", 3.0)];
        let second_ids: Vec<_> = second_events.iter().map(|e| e.id).collect();
        let second = upsert(&state, record("abc", "City"), second_events)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        let stored = find_by_external_id(&state, "abc").await.unwrap().unwrap();
        assert_eq!(stored.home_team_name, "City");
        let stored_ids: Vec<_> = stored.events.iter().map(|e| e.id).collect();
        assert_eq!(stored_ids, second_ids);
        assert!(stored.events.iter().all(|e| e.match_id == Some(first)));
    }

    #[tokio::test]
    async fn empty_upsert_is_found_again_under_the_same_id() {
        let (state, store) = state_with_store().await;
        assert!(find_by_external_id(&state, "abc123").await.unwrap().is_none());

        let id = upsert(&state, record("abc123", "Rovers"), Vec::new())
            .await
            .unwrap();

        let found = find_by_external_id(&state, "abc123").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(found.events.is_empty());
        assert!(events_for(&state, id).await.unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn events_read_back_carry_the_match_id() {
        let (state, store) = state_with_store().await;
        let id = upsert(&state, record("abc", "Rovers"), vec![event("Goal", 1.0)])
            .await
            .unwrap();

        let mut untagged = store.find_match(id).await.unwrap().unwrap();
        for event in &mut untagged.events {
            event.match_id = None;
        }
        store.replace_match(untagged).await.unwrap();

        let events = events_for(&state, id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].match_id, Some(id));
        let detail = get_match(&state, id).await.unwrap();
        assert_eq!(detail.events[0].match_id, Some(id));
    }

    #[tokio::test]
    async fn concurrent_upserts_never_duplicate() {
        let (state, store) = state_with_store().await;

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move {
                    upsert(&state, record("race", "Rovers"), vec![event("Pass", i as f64)]).await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap());
        }

        assert_eq!(store.len(), 1);
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    }

    /// Store whose first external-id lookup misses, as if another process
    /// inserted the same video between our lookup and our insert.
    #[derive(Clone)]
    struct StaleLookupStore {
        inner: InMemoryMatchStore,
        missed: Arc<AtomicBool>,
    }

    impl MatchStore for StaleLookupStore {
        fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
            self.inner.find_match(id)
        }

        fn find_by_external_id(
            &self,
            youtube_id: String,
        ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Box::pin(async { Ok(None) });
            }
            self.inner.find_by_external_id(youtube_id)
        }

        fn insert_match(
            &self,
            record: MatchRecord,
            events: Vec<MatchEventEntity>,
        ) -> BoxFuture<'static, StorageResult<Uuid>> {
            self.inner.insert_match(record, events)
        }

        fn replace_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.replace_match(entity)
        }

        fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchSummaryEntity>>> {
            self.inner.list_matches()
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    #[tokio::test]
    async fn insert_conflict_falls_back_to_update() {
        let inner = InMemoryMatchStore::new();
        let existing = inner
            .insert_match(record("abc", "Rovers"), Vec::new())
            .await
            .unwrap();
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryDraftStore::new()));
        state
            .install_match_store(Arc::new(StaleLookupStore {
                inner: inner.clone(),
                missed: Arc::new(AtomicBool::new(false)),
            }))
            .await;

        let id = upsert(&state, record("abc", "City"), vec![event("Goal", 9.0)])
            .await
            .unwrap();

        assert_eq!(id, existing);
        assert_eq!(inner.len(), 1);
        let stored = inner.find_match(id).await.unwrap().unwrap();
        assert_eq!(stored.home_team_name, "City");
        assert_eq!(stored.events[0].match_id, Some(id));
    }

    #[tokio::test]
    async fn unknown_match_events_are_not_found() {
        let (state, _store) = state_with_store().await;
        assert!(matches!(
            events_for(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_external_id_yields_none() {
        let (state, _store) = state_with_store().await;
        assert!(find_by_external_id(&state, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn degraded_mode_rejects_calls() {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryDraftStore::new()));
        assert!(matches!(
            list_matches(&state).await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn listing_omits_events() {
        let (state, _store) = state_with_store().await;
        upsert(&state, record("a", "Rovers"), vec![event("Goal", 1.0)])
            .await
            .unwrap();
        upsert(&state, record("b", "City"), Vec::new()).await.unwrap();

        let summaries = list_matches(&state).await.unwrap();
        assert_eq!(summaries.len(), 2);
    }
}
