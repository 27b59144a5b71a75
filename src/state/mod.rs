pub mod playback;
pub mod roster;
pub mod setup;
mod sse;
pub mod timecode;
pub mod tracking;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{draft_store::DraftStore, match_store::MatchStore},
    error::ServiceError,
    services::{save_scheduler::SaveScheduler, sse_events},
    state::{
        playback::{PlaybackPoller, ReportedPlayback},
        setup::MatchSetup,
        tracking::TrackingSession,
    },
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

const SSE_CAPACITY: usize = 32;

/// Central application state: storage handles, setup draft, tracking session
/// and the playback clock.
pub struct AppState {
    config: AppConfig,
    match_store: RwLock<Option<Arc<dyn MatchStore>>>,
    draft_store: Arc<dyn DraftStore>,
    degraded: watch::Sender<bool>,
    sse: SseHub,
    /// Setup draft, `None` until first read from the draft store.
    setup: Mutex<Option<MatchSetup>>,
    tracking: RwLock<Option<TrackingSession>>,
    playback: ReportedPlayback,
    poller: Mutex<Option<PlaybackPoller>>,
    saves: SaveScheduler,
    upsert_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a match store is installed.
    pub fn new(config: AppConfig, draft_store: Arc<dyn DraftStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let saves = SaveScheduler::new(config.save_debounce);
        Arc::new(Self {
            config,
            match_store: RwLock::new(None),
            draft_store,
            degraded: degraded_tx,
            sse: SseHub::new(SSE_CAPACITY),
            setup: Mutex::new(None),
            tracking: RwLock::new(None),
            playback: ReportedPlayback::new(),
            poller: Mutex::new(None),
            saves,
            upsert_locks: DashMap::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.match_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current match store, or [`ServiceError::Degraded`] when none is usable.
    pub async fn require_match_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.match_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new match store implementation and leave degraded mode.
    pub async fn install_match_store(&self, store: Arc<dyn MatchStore>) {
        {
            let mut guard = self.match_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current match store and enter degraded mode.
    pub async fn clear_match_store(&self) {
        {
            let mut guard = self.match_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag and notify SSE clients when the value changes.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });

        if changed {
            sse_events::broadcast_system_status(self, value);
        }
    }

    pub fn draft_store(&self) -> &Arc<dyn DraftStore> {
        &self.draft_store
    }

    /// Broadcast hub behind the `/sse` stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    pub fn setup(&self) -> &Mutex<Option<MatchSetup>> {
        &self.setup
    }

    pub fn tracking(&self) -> &RwLock<Option<TrackingSession>> {
        &self.tracking
    }

    pub fn playback(&self) -> &ReportedPlayback {
        &self.playback
    }

    pub fn poller(&self) -> &Mutex<Option<PlaybackPoller>> {
        &self.poller
    }

    pub fn saves(&self) -> &SaveScheduler {
        &self.saves
    }

    /// Lock serialising upserts for one external video id.
    pub fn upsert_lock(&self, youtube_id: &str) -> Arc<Mutex<()>> {
        self.upsert_locks
            .entry(youtube_id.to_string())
            .or_default()
            .clone()
    }
}
