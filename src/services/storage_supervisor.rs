use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{match_store::MatchStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Keep a match store installed in the shared state, reconnecting with
/// exponential backoff and flagging degraded mode while it is unreachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn MatchStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_match_store(store.clone()).await;
                info!("match store connected; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store.as_ref()).await;

                warn!("match store lost; dropping the connection");
                state.clear_match_store().await;
            }
            Err(err) => {
                warn!(error = %err, "match store connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = next_delay(delay);
    }
}

/// Poll the store until it fails and cannot be revived in place.
async fn watch_health(state: &SharedState, store: &dyn MatchStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("match store healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "match store health check failed; entering degraded mode");
                state.update_degraded(true);
                if !reconnect(store).await {
                    return;
                }
                info!("match store reconnected after health check failure");
                state.update_degraded(false);
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Try to revive the existing connection a bounded number of times.
async fn reconnect(store: &dyn MatchStore) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "match store reconnect attempt failed");
                sleep(delay).await;
                delay = next_delay(delay);
            }
        }
    }
    false
}

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use futures::future::BoxFuture;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            draft_store::MemoryDraftStore,
            match_store::memory::InMemoryMatchStore,
            models::{MatchEntity, MatchEventEntity, MatchRecord, MatchSummaryEntity},
            storage::StorageResult,
        },
        state::AppState,
    };

    /// Memory store whose health can be switched off from the test.
    #[derive(Clone, Default)]
    struct SwitchableStore {
        inner: InMemoryMatchStore,
        down: Arc<AtomicBool>,
        reconnects: Arc<AtomicUsize>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("switched off")]
    struct SwitchedOff;

    impl SwitchableStore {
        fn status(&self) -> StorageResult<()> {
            if self.down.load(Ordering::SeqCst) {
                Err(StorageError::unavailable("switched off".into(), SwitchedOff))
            } else {
                Ok(())
            }
        }
    }

    impl MatchStore for SwitchableStore {
        fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
            self.inner.find_match(id)
        }

        fn find_by_external_id(
            &self,
            youtube_id: String,
        ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
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
            let status = self.status();
            Box::pin(async move { status })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            let status = self.status();
            Box::pin(async move { status })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_store_flips_degraded_and_recovers() {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryDraftStore::new()));
        let store = SwitchableStore::default();
        let connect_store = store.clone();

        tokio::spawn(run(state.clone(), move || {
            let store: Arc<dyn MatchStore> = Arc::new(connect_store.clone());
            async move { Ok::<_, StorageError>(store) }
        }));

        sleep(Duration::from_millis(10)).await;
        assert!(!state.is_degraded());

        store.down.store(true, Ordering::SeqCst);
        sleep(HEALTH_POLL_INTERVAL + Duration::from_millis(10)).await;
        assert!(state.is_degraded());
        assert!(store.reconnects.load(Ordering::SeqCst) >= 1);

        store.down.store(false, Ordering::SeqCst);
        sleep(MAX_DELAY * 2).await;
        assert!(!state.is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connections_keep_degraded_mode() {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryDraftStore::new()));
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        tokio::spawn(run(state.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<Arc<dyn MatchStore>, _>(StorageError::unavailable(
                    "refused".into(),
                    SwitchedOff,
                ))
            }
        }));

        sleep(Duration::from_secs(8)).await;
        assert!(state.is_degraded());
        // 0s, 1s, 3s, 7s
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(next_delay(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(next_delay(Duration::from_secs(8)), MAX_DELAY);
    }
}
