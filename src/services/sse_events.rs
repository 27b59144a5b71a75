use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::sse::{
        MatchSaveFailedEvent, MatchSavedEvent, PlaybackPausedEvent, ServerEvent, SystemStatus,
    },
    state::{AppState, timecode},
};

const EVENT_MATCH_SAVED: &str = "match.saved";
const EVENT_MATCH_SAVE_FAILED: &str = "match.save_failed";
const EVENT_PLAYBACK_PAUSED: &str = "playback.paused";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast that the tracking session reached the match store.
pub fn broadcast_match_saved(
    state: &AppState,
    match_id: Uuid,
    youtube_id: &str,
    event_count: usize,
) {
    let payload = MatchSavedEvent {
        match_id,
        youtube_id: youtube_id.to_string(),
        event_count,
    };
    send_event(state, EVENT_MATCH_SAVED, &payload);
}

/// Broadcast a failed save so the user learns the remote copy is stale.
pub fn broadcast_match_save_failed(state: &AppState, youtube_id: &str, message: String) {
    let payload = MatchSaveFailedEvent {
        youtube_id: youtube_id.to_string(),
        message,
    };
    send_event(state, EVENT_MATCH_SAVE_FAILED, &payload);
}

pub fn broadcast_playback_paused(state: &AppState, current_time: f64) {
    let payload = PlaybackPausedEvent {
        current_time,
        time_string: timecode::format(current_time),
    };
    send_event(state, EVENT_PLAYBACK_PAUSED, &payload);
}

/// Broadcast a degraded mode transition.
pub fn broadcast_system_status(state: &AppState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
