//! Tracking screen operations.
//!
//! Every change to events or the roster (re)schedules a debounced save of the
//! whole session; [`save_now`] performs the same upsert immediately.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    services::{gateway, sse_events},
    state::{
        SharedState,
        playback::PlaybackSource,
        roster::{Player, PlayerPatch, TeamSide},
        tracking::{EventPatch, EventType, MatchEvent, RemovedPlayer, TrackingSession},
    },
};

fn no_session() -> ServiceError {
    ServiceError::InvalidState("no tracking session is open".into())
}

/// Snapshot of the open session.
pub async fn session(state: &SharedState) -> Result<TrackingSession, ServiceError> {
    state.tracking().read().await.clone().ok_or_else(no_session)
}

/// Run `change` against the open session and schedule a save when it reports
/// a modification.
async fn mutate<T, F>(state: &SharedState, change: F) -> Result<T, ServiceError>
where
    F: FnOnce(&mut TrackingSession) -> Result<(T, bool), ServiceError>,
{
    let (value, changed) = {
        let mut guard = state.tracking().write().await;
        let session = guard.as_mut().ok_or_else(no_session)?;
        change(session)?
    };

    if changed {
        schedule_save(state).await;
    }
    Ok(value)
}

/// Queue a debounced save, superseding any save still waiting.
pub async fn schedule_save(state: &SharedState) {
    let job_state = state.clone();
    state
        .saves()
        .schedule(async move {
            // Failures are already logged and broadcast.
            let _ = save_now(&job_state).await;
        })
        .await;
}

/// Upsert the session into the match store right away.
pub async fn save_now(state: &SharedState) -> Result<Uuid, ServiceError> {
    let (record, events) = session(state).await?.to_record();
    let youtube_id = record.youtube_id.clone();
    let event_count = events.len();

    match gateway::upsert(state, record, events).await {
        Ok(match_id) => {
            if let Some(session) = state.tracking().write().await.as_mut()
                && session.youtube_id == youtube_id
            {
                session.match_id = Some(match_id);
            }
            info!(%match_id, youtube_id, event_count, "tracking session saved");
            sse_events::broadcast_match_saved(state, match_id, &youtube_id, event_count);
            Ok(match_id)
        }
        Err(err) => {
            warn!(youtube_id, error = %err, "failed to save tracking session");
            sse_events::broadcast_match_save_failed(state, &youtube_id, err.to_string());
            Err(err)
        }
    }
}

/// Best known playback position: the poller's last sample, else the source itself.
pub async fn current_time(state: &SharedState) -> Option<f64> {
    let sampled = state
        .poller()
        .lock()
        .await
        .as_ref()
        .and_then(|poller| poller.latest());
    sampled.or_else(|| state.playback().current_time())
}

/// Record a position reported by the player; a pause is broadcast.
pub async fn report_playback(
    state: &SharedState,
    position: f64,
    paused: bool,
) -> Result<f64, ServiceError> {
    if state.tracking().read().await.is_none() {
        return Err(no_session());
    }

    let snapped = state.playback().report(position, paused);
    if paused {
        sse_events::broadcast_playback_paused(state, snapped);
    }
    Ok(snapped)
}

pub async fn select(
    state: &SharedState,
    player_id: Option<Uuid>,
    event_type: Option<EventType>,
) -> Result<TrackingSession, ServiceError> {
    let mut guard = state.tracking().write().await;
    let session = guard.as_mut().ok_or_else(no_session)?;
    session.select_player(player_id)?;
    session.select_event_type(event_type);
    Ok(session.clone())
}

/// Tag the current selection at `at`, or at the current playback position.
pub async fn track_event(
    state: &SharedState,
    at: Option<f64>,
) -> Result<MatchEvent, ServiceError> {
    let position = match at {
        Some(position) => position,
        None => current_time(state).await.ok_or_else(|| {
            ServiceError::InvalidInput("playback position unknown; report it first".into())
        })?,
    };

    mutate(state, |session| match session.track_event(position) {
        Some(event) => Ok((event.clone(), true)),
        None => Err(ServiceError::InvalidInput(
            "select a player and an event type first".into(),
        )),
    })
    .await
}

pub async fn edit_event(
    state: &SharedState,
    id: Uuid,
    patch: EventPatch,
) -> Result<MatchEvent, ServiceError> {
    mutate(state, |session| {
        let event = session.edit_event(id, patch)?;
        Ok((event.clone(), true))
    })
    .await
}

pub async fn delete_event(state: &SharedState, id: Uuid) -> Result<MatchEvent, ServiceError> {
    mutate(state, |session| {
        let removed = session
            .delete_event(id)
            .ok_or_else(|| ServiceError::NotFound(format!("event `{id}` does not exist")))?;
        Ok((removed, true))
    })
    .await
}

/// Add a player mid-match. Blank fields are a no-op and return `None`.
pub async fn add_player(
    state: &SharedState,
    name: &str,
    number: &str,
    team: TeamSide,
) -> Result<Option<Player>, ServiceError> {
    mutate(state, |session| {
        let added = session.add_player(name, number, team)?.cloned();
        let changed = added.is_some();
        Ok((added, changed))
    })
    .await
}

pub async fn edit_player(
    state: &SharedState,
    id: Uuid,
    patch: PlayerPatch,
) -> Result<Player, ServiceError> {
    mutate(state, |session| {
        let player = session.edit_player(id, patch)?.clone();
        Ok((player, true))
    })
    .await
}

/// Remove a player and, once confirmed, all of their events.
pub async fn remove_player(
    state: &SharedState,
    id: Uuid,
    confirmed: bool,
) -> Result<RemovedPlayer, ServiceError> {
    mutate(state, |session| {
        let removed = session.remove_player(id, confirmed)?;
        Ok((removed, true))
    })
    .await
}

/// Close the session, optionally saving it first.
///
/// When the save fails the session stays open.
pub async fn end(state: &SharedState, save: bool) -> Result<Option<Uuid>, ServiceError> {
    let saved = if save {
        Some(save_now(state).await?)
    } else {
        None
    };

    let closed = state.tracking().write().await.take().ok_or_else(no_session)?;
    state.saves().cancel().await;
    state.poller().lock().await.take();
    state.playback().reset();

    info!(youtube_id = %closed.youtube_id, events = closed.events().len(), "tracking ended");
    Ok(saved)
}
