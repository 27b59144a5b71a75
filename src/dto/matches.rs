//! Payloads of the read-only match endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MatchEntity, MatchEventEntity, MatchSummaryEntity, PlayerEntity},
    dto::{format_system_time, validation::validate_youtube_id},
    state::{roster::TeamSide, tracking::EventType},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoredPlayer {
    pub id: Uuid,
    pub name: String,
    pub number: u16,
    pub team: TeamSide,
}

impl From<PlayerEntity> for StoredPlayer {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            number: value.number,
            team: value.team.into(),
        }
    }
}

/// Stored match listed without its events.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchSummary {
    pub id: Uuid,
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    /// RFC 3339 date of the match.
    pub date: String,
    pub players: Vec<StoredPlayer>,
    /// RFC 3339 time of the last save.
    pub updated_at: String,
}

impl From<MatchSummaryEntity> for MatchSummary {
    fn from(value: MatchSummaryEntity) -> Self {
        Self {
            id: value.id,
            youtube_id: value.youtube_id,
            home_team_name: value.home_team_name,
            away_team_name: value.away_team_name,
            date: format_system_time(value.date),
            players: value.players.into_iter().map(Into::into).collect(),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Event as stored in a match document.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoredEvent {
    pub id: Uuid,
    pub match_id: Option<Uuid>,
    pub timestamp: f64,
    pub time_string: String,
    pub player_id: Uuid,
    pub player_name: String,
    pub player_number: u16,
    /// Display label of the event type; unknown labels are passed through.
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Value>,
}

impl From<MatchEventEntity> for StoredEvent {
    fn from(value: MatchEventEntity) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            timestamp: value.timestamp,
            time_string: value.time_string,
            player_id: value.player_id,
            player_name: value.player_name,
            player_number: value.player_number,
            event_type: value.event_type,
            additional_data: value.additional_data,
        }
    }
}

/// Stored match with its embedded events.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub created_at: String,
    pub events: Vec<StoredEvent>,
}

impl From<MatchEntity> for MatchDetail {
    fn from(mut value: MatchEntity) -> Self {
        let created_at = format_system_time(value.created_at);
        let events = std::mem::take(&mut value.events)
            .into_iter()
            .map(Into::into)
            .collect();
        Self {
            summary: MatchSummaryEntity::from(value).into(),
            created_at,
            events,
        }
    }
}

/// Lookup by external video id.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MatchLookupQuery {
    /// Same character rules as the setup video id; never empty.
    #[validate(length(min = 1), custom(function = "validate_youtube_id"))]
    pub youtube_id: String,
}

/// Event type known to the tracker.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventTypeView {
    pub value: EventType,
    pub label: String,
}

impl From<EventType> for EventTypeView {
    fn from(value: EventType) -> Self {
        Self {
            value,
            label: value.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(youtube_id: &str) -> MatchLookupQuery {
        MatchLookupQuery {
            youtube_id: youtube_id.into(),
        }
    }

    #[test]
    fn lookup_accepts_plain_video_ids() {
        assert!(lookup("dQw4w9WgXcQ").validate().is_ok());
    }

    #[test]
    fn lookup_rejects_path_and_query_characters() {
        for id in ["", "x/../../_users", "abc?rev=1", "abc#top", "a b"] {
            assert!(lookup(id).validate().is_err(), "{id:?} should be rejected");
        }
    }
}
