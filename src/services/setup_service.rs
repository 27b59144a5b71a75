//! Setup screen operations. Every mutation is applied to a copy of the draft,
//! persisted through the draft store, and only then committed in memory.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    services::gateway,
    state::{
        SharedState,
        playback::PlaybackPoller,
        roster::{PlayerPatch, RosterError, TeamSide},
        setup::{MatchSetup, SetupHeaderPatch},
        tracking::TrackingSession,
    },
};

/// Current setup draft, read from the draft store on first access.
pub async fn load(state: &SharedState) -> Result<MatchSetup, ServiceError> {
    let mut guard = state.setup().lock().await;
    Ok(ensure_loaded(state, &mut *guard).await?.clone())
}

async fn ensure_loaded<'a>(
    state: &SharedState,
    slot: &'a mut Option<MatchSetup>,
) -> Result<&'a mut MatchSetup, ServiceError> {
    let setup = match slot.take() {
        Some(setup) => setup,
        None => state
            .draft_store()
            .load()
            .await?
            .map(MatchSetup::from)
            .unwrap_or_default(),
    };
    Ok(slot.insert(setup))
}

/// Apply `change` to the draft and persist the result.
///
/// `change` returns `false` when it left the draft untouched, in which case
/// nothing is written.
async fn mutate<F>(state: &SharedState, change: F) -> Result<MatchSetup, ServiceError>
where
    F: FnOnce(&mut MatchSetup) -> Result<bool, ServiceError>,
{
    let mut guard = state.setup().lock().await;
    let current = ensure_loaded(state, &mut *guard).await?;

    let mut next = current.clone();
    if !change(&mut next)? {
        return Ok(next);
    }

    state.draft_store().save(next.clone().into()).await?;
    *current = next.clone();
    Ok(next)
}

/// Partially edit the video id and team names.
pub async fn update_match(
    state: &SharedState,
    patch: SetupHeaderPatch,
) -> Result<MatchSetup, ServiceError> {
    mutate(state, |setup| {
        setup.apply_header(patch);
        Ok(true)
    })
    .await
}

/// Append a player; blank name or number leaves the draft unchanged.
pub async fn add_player(
    state: &SharedState,
    name: &str,
    number: &str,
    team: TeamSide,
) -> Result<MatchSetup, ServiceError> {
    mutate(state, |setup| Ok(setup.roster.add(name, number, team)?.is_some())).await
}

pub async fn edit_player(
    state: &SharedState,
    id: Uuid,
    patch: PlayerPatch,
) -> Result<MatchSetup, ServiceError> {
    mutate(state, |setup| {
        setup.roster.edit(id, patch)?;
        Ok(true)
    })
    .await
}

pub async fn remove_player(state: &SharedState, id: Uuid) -> Result<MatchSetup, ServiceError> {
    mutate(state, |setup| {
        setup
            .roster
            .remove(id)
            .ok_or(RosterError::UnknownPlayer(id))?;
        Ok(true)
    })
    .await
}

/// Clear the draft, both in memory and in the draft store.
pub async fn reset(state: &SharedState) -> Result<MatchSetup, ServiceError> {
    let mut guard = state.setup().lock().await;
    state.draft_store().clear().await?;
    *guard = Some(MatchSetup::default());
    info!("setup draft cleared");
    Ok(MatchSetup::default())
}

/// Leave the setup screen and open a tracking session.
///
/// When the match store already holds a match for the video, its events are
/// loaded so tagging resumes where it stopped. A degraded store only costs
/// that resume; tracking still starts.
pub async fn start_tracking(state: &SharedState) -> Result<TrackingSession, ServiceError> {
    let ready = {
        let mut guard = state.setup().lock().await;
        let setup = ensure_loaded(state, &mut *guard).await?;
        setup.ready(state.config().min_players)?
    };

    let mut tracking = state.tracking().write().await;
    if let Some(active) = tracking.as_ref() {
        return Err(ServiceError::InvalidState(format!(
            "a tracking session for `{}` is already open",
            active.youtube_id
        )));
    }

    let mut session = TrackingSession::new(ready);
    match gateway::find_by_external_id(state, &session.youtube_id).await {
        Ok(Some(existing)) => {
            let stored = existing.events.len();
            session.date = existing.date;
            let preserved = session.resume(existing.id, existing.events);
            if preserved > 0 {
                warn!(
                    match_id = %existing.id,
                    preserved,
                    "stored events with unknown types are kept but not editable"
                );
            }
            info!(
                match_id = %existing.id,
                stored,
                resumed = session.events().len(),
                "resuming stored match"
            );
        }
        Ok(None) => {}
        Err(ServiceError::Degraded) => {
            warn!("match store unavailable; starting tracking without stored events");
        }
        Err(err) => {
            warn!(error = %err, "failed to look up stored match; starting fresh");
        }
    }

    state.playback().reset();
    let poller = PlaybackPoller::spawn(
        Arc::new(state.playback().clone()),
        state.config().playback_poll,
    );
    *state.poller().lock().await = Some(poller);

    info!(youtube_id = %session.youtube_id, "tracking started");
    *tracking = Some(session.clone());
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            draft_store::{DraftStore, MemoryDraftStore},
            match_store::{MatchStore, memory::InMemoryMatchStore},
            models::{MatchEventEntity, MatchRecord},
        },
        state::AppState,
    };

    fn fresh_state() -> (SharedState, MemoryDraftStore) {
        let drafts = MemoryDraftStore::new();
        let state = AppState::new(AppConfig::default(), Arc::new(drafts.clone()));
        (state, drafts)
    }

    async fn fill(state: &SharedState) {
        update_match(
            state,
            SetupHeaderPatch {
                youtube_id: Some("abc123".into()),
                home_team_name: Some("Rovers".into()),
                away_team_name: Some("United".into()),
            },
        )
        .await
        .unwrap();
        add_player(state, "A", "10", TeamSide::Home).await.unwrap();
        add_player(state, "B", "7", TeamSide::Away).await.unwrap();
    }

    #[tokio::test]
    async fn every_mutation_is_persisted() {
        let (state, drafts) = fresh_state();
        fill(&state).await;

        let draft = drafts.load().await.unwrap().unwrap();
        assert_eq!(draft.youtube_id, "abc123");
        assert_eq!(draft.players.len(), 2);

        let id = draft.players[0].id;
        remove_player(&state, id).await.unwrap();
        assert_eq!(drafts.load().await.unwrap().unwrap().players.len(), 1);
    }

    #[tokio::test]
    async fn draft_is_restored_on_first_access() {
        let (state, drafts) = fresh_state();
        fill(&state).await;

        let restarted = AppState::new(AppConfig::default(), Arc::new(drafts.clone()));
        let setup = load(&restarted).await.unwrap();
        assert_eq!(setup.home_team_name, "Rovers");
        assert_eq!(setup.roster.len(), 2);
    }

    #[tokio::test]
    async fn blank_player_is_not_added() {
        let (state, drafts) = fresh_state();
        let setup = add_player(&state, "  ", "4", TeamSide::Home).await.unwrap();
        assert!(setup.roster.is_empty());
        assert!(drafts.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn removing_unknown_player_is_not_found() {
        let (state, _drafts) = fresh_state();
        assert!(matches!(
            remove_player(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn incomplete_setup_does_not_start_tracking() {
        let (state, _drafts) = fresh_state();
        add_player(&state, "A", "10", TeamSide::Home).await.unwrap();

        assert!(matches!(
            start_tracking(&state).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(state.tracking().read().await.is_none());
    }

    #[tokio::test]
    async fn tracking_starts_in_degraded_mode() {
        let (state, _drafts) = fresh_state();
        fill(&state).await;

        let session = start_tracking(&state).await.unwrap();
        assert_eq!(session.roster().len(), 2);
        assert!(session.match_id.is_none());
        assert!(state.poller().lock().await.is_some());

        assert!(matches!(
            start_tracking(&state).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn tracking_resumes_stored_events() {
        let (state, _drafts) = fresh_state();
        let store = InMemoryMatchStore::new();
        state.install_match_store(Arc::new(store.clone())).await;
        fill(&state).await;

        let setup = load(&state).await.unwrap();
        let player = &setup.roster.players()[0];
        let stored_id = store
            .insert_match(
                MatchRecord {
                    youtube_id: "abc123".into(),
                    home_team_name: "Rovers".into(),
                    away_team_name: "United".into(),
                    date: std::time::SystemTime::now(),
                    players: Vec::new(),
                },
                vec![MatchEventEntity {
                    id: Uuid::new_v4(),
                    match_id: None,
                    timestamp: 61.0,
                    time_string: "1:01".into(),
                    player_id: player.id,
                    player_name: player.name.clone(),
                    player_number: player.number,
                    event_type: "Goal".into(),
                    additional_data: None,
                }],
            )
            .await
            .unwrap();

        let session = start_tracking(&state).await.unwrap();
        assert_eq!(session.match_id, Some(stored_id));
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.events()[0].time_string, "1:01");
    }

    #[tokio::test]
    async fn resave_keeps_stored_events_of_unknown_type() {
        let (state, _drafts) = fresh_state();
        let store = InMemoryMatchStore::new();
        state.install_match_store(Arc::new(store.clone())).await;
        fill(&state).await;

        let setup = load(&state).await.unwrap();
        let player = &setup.roster.players()[0];
        let event = |kind: &str, at: f64| MatchEventEntity {
            id: Uuid::new_v4(),
            match_id: None,
            timestamp: at,
            time_string: crate::state::timecode::format(at),
            player_id: player.id,
            player_name: player.name.clone(),
            player_number: player.number,
            event_type: kind.into(),
            additional_data: None,
        };
        let stored_id = store
            .insert_match(
                MatchRecord {
                    youtube_id: "abc123".into(),
                    home_team_name: "Rovers".into(),
                    away_team_name: "United".into(),
                    date: std::time::SystemTime::now(),
                    players: Vec::new(),
                },
                vec![event("Goal", 12.0), event("Header", 40.0)],
            )
            .await
            .unwrap();

        let session = start_tracking(&state).await.unwrap();
        assert_eq!(session.events().len(), 1);

        let saved = crate::services::tracking_service::save_now(&state)
            .await
            .unwrap();
        assert_eq!(saved, stored_id);

        let stored = store.find_match(stored_id).await.unwrap().unwrap();
        let mut kinds: Vec<_> = stored.events.iter().map(|e| e.event_type.as_str()).collect();
        kinds.sort_unstable();
        assert_eq!(kinds, ["Goal", "Header"]);
    }

    #[tokio::test]
    async fn reset_clears_draft() {
        let (state, drafts) = fresh_state();
        fill(&state).await;
        reset(&state).await.unwrap();
        assert!(drafts.load().await.unwrap().is_none());
        assert_eq!(load(&state).await.unwrap(), MatchSetup::default());
    }
}
