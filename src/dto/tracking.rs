use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::roster::PlayerView,
    state::tracking::{EventPatch, EventType, MatchEvent, TrackingSession},
};

/// Tagged event as exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventView {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    pub timestamp: f64,
    pub time_string: String,
    pub player_id: Uuid,
    pub player_name: String,
    pub player_number: u16,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Value>,
}

impl EventView {
    pub fn new(event: &MatchEvent, match_id: Option<Uuid>) -> Self {
        Self {
            id: event.id,
            match_id,
            timestamp: event.timestamp,
            time_string: event.time_string.clone(),
            player_id: event.player_id,
            player_name: event.player_name.clone(),
            player_number: event.player_number,
            event_type: event.event_type,
            additional_data: event.additional_data.clone(),
        }
    }
}

/// Full snapshot of the tracking screen.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackingSessionResponse {
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    /// Identifier of the stored match, once saved or resumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    pub players: Vec<PlayerView>,
    pub selected_player_id: Option<Uuid>,
    pub selected_event_type: Option<EventType>,
    pub events: Vec<EventView>,
    /// Latest playback position known to the server.
    pub current_time: Option<f64>,
}

impl TrackingSessionResponse {
    pub fn new(session: &TrackingSession, current_time: Option<f64>) -> Self {
        Self {
            youtube_id: session.youtube_id.clone(),
            home_team_name: session.home_team_name.clone(),
            away_team_name: session.away_team_name.clone(),
            match_id: session.match_id,
            players: session.roster().players().iter().map(PlayerView::from).collect(),
            selected_player_id: session.selected_player().map(|player| player.id),
            selected_event_type: session.selected_event_type(),
            events: session
                .events()
                .iter()
                .map(|event| EventView::new(event, session.match_id))
                .collect(),
            current_time,
        }
    }
}

/// Replace the current selection; an omitted or null field clears it.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectionRequest {
    #[serde(default)]
    pub player_id: Option<Uuid>,
    #[serde(default)]
    pub event_type: Option<EventType>,
}

/// Tag the current selection. Without `current_time` the server uses the
/// last playback position it knows.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct TrackEventRequest {
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub current_time: Option<f64>,
}

/// Edit dialog payload. `time_string` and `timestamp` are mutually exclusive.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditEventRequest {
    #[serde(default)]
    #[validate(length(max = 16))]
    pub time_string: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub player_id: Option<Uuid>,
    #[serde(default)]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub additional_data: Option<Value>,
}

impl From<EditEventRequest> for EventPatch {
    fn from(value: EditEventRequest) -> Self {
        Self {
            time_string: value.time_string,
            timestamp: value.timestamp,
            player_id: value.player_id,
            event_type: value.event_type,
            additional_data: value.additional_data,
        }
    }
}

/// Position reported by the embedded player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlaybackReportRequest {
    #[validate(range(min = 0.0))]
    pub current_time: f64,
    #[serde(default)]
    pub paused: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaybackResponse {
    pub current_time: Option<f64>,
    pub time_string: Option<String>,
}

/// Query of `DELETE /tracking/players/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RemovePlayerQuery {
    /// Required when the player already has tagged events.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemovePlayerResponse {
    pub player: PlayerView,
    pub removed_events: usize,
}

/// Query of `POST /tracking/end`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EndSessionQuery {
    /// Save the session before closing it (defaults to `true`).
    #[serde(default = "default_true")]
    pub save: bool,
}

impl Default for EndSessionQuery {
    fn default() -> Self {
        Self { save: true }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveResponse {
    pub match_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EndSessionResponse {
    /// Identifier of the stored match when the session was saved on the way out.
    pub match_id: Option<Uuid>,
}
