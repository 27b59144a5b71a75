//! Storage-facing entities shared by every match store backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::SystemTime;
use uuid::Uuid;

/// Side of the pitch a player belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TeamSideEntity {
    Home,
    Away,
}

/// Roster entry persisted with the setup draft and the match document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Identifier generated when the player was added to the roster.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Shirt number.
    pub number: u16,
    /// Team the player plays for.
    pub team: TeamSideEntity,
}

/// Event embedded inside a match document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEventEntity {
    /// Identifier generated when the event was tagged.
    pub id: Uuid,
    /// Internal identifier of the owning match.
    pub match_id: Option<Uuid>,
    /// Playback position in seconds.
    pub timestamp: f64,
    /// Playback position rendered as `M:SS`.
    pub time_string: String,
    /// Player the event is attributed to.
    pub player_id: Uuid,
    /// Snapshot of the player's name when the event was tagged or edited.
    pub player_name: String,
    /// Snapshot of the player's shirt number.
    pub player_number: u16,
    /// Display label of the event type (e.g. "Shot on target").
    pub event_type: String,
    /// Free-form payload attached by clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Value>,
}

/// Match header fields supplied by callers when saving a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRecord {
    /// External video identifier, the natural key of the match.
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    /// Date of the match (defaults to the save time).
    pub date: SystemTime,
    pub players: Vec<PlayerEntity>,
}

/// Aggregate match document persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEntity {
    /// Identifier assigned by the store on insertion.
    pub id: Uuid,
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub date: SystemTime,
    pub players: Vec<PlayerEntity>,
    /// Events embedded in the match document.
    pub events: Vec<MatchEventEntity>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Match projection without its embedded events, used for listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchSummaryEntity {
    pub id: Uuid,
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub date: SystemTime,
    pub players: Vec<PlayerEntity>,
    pub updated_at: SystemTime,
}

/// Setup draft persisted between restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetupDraftEntity {
    #[serde(default)]
    pub youtube_id: String,
    #[serde(default)]
    pub home_team_name: String,
    #[serde(default)]
    pub away_team_name: String,
    #[serde(default)]
    pub players: Vec<PlayerEntity>,
}

impl MatchEntity {
    /// Build a freshly inserted match, tagging every event with the new identifier.
    pub fn from_record(id: Uuid, record: MatchRecord, events: Vec<MatchEventEntity>) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            youtube_id: record.youtube_id,
            home_team_name: record.home_team_name,
            away_team_name: record.away_team_name,
            date: record.date,
            players: record.players,
            events: tag_events(id, events),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite header fields and embedded events, keeping identity and creation time.
    pub fn apply_record(&mut self, record: MatchRecord, events: Vec<MatchEventEntity>) {
        self.youtube_id = record.youtube_id;
        self.home_team_name = record.home_team_name;
        self.away_team_name = record.away_team_name;
        self.date = record.date;
        self.players = record.players;
        self.events = tag_events(self.id, events);
        self.updated_at = SystemTime::now();
    }
}

/// Stamp each event with the owning match identifier.
pub fn tag_events(match_id: Uuid, events: Vec<MatchEventEntity>) -> Vec<MatchEventEntity> {
    events
        .into_iter()
        .map(|mut event| {
            event.match_id = Some(match_id);
            event
        })
        .collect()
}

impl From<MatchEntity> for MatchSummaryEntity {
    fn from(entity: MatchEntity) -> Self {
        Self {
            id: entity.id,
            youtube_id: entity.youtube_id,
            home_team_name: entity.home_team_name,
            away_team_name: entity.away_team_name,
            date: entity.date,
            players: entity.players,
            updated_at: entity.updated_at,
        }
    }
}
