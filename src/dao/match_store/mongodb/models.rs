use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{MatchEntity, MatchEventEntity, MatchSummaryEntity, PlayerEntity};

/// Shape of a match inside the `matches` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    youtube_id: String,
    home_team_name: String,
    away_team_name: String,
    date: DateTime,
    players: Vec<PlayerEntity>,
    #[serde(default)]
    events: Vec<MatchEventEntity>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            youtube_id: value.youtube_id,
            home_team_name: value.home_team_name,
            away_team_name: value.away_team_name,
            date: DateTime::from_system_time(value.date),
            players: value.players,
            events: value.events,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl MongoMatchDocument {
    pub fn into_entity(self) -> MongoResult<MatchEntity> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|_| MongoDaoError::InvalidDocId { doc_id: self.id })?;
        Ok(MatchEntity {
            id,
            youtube_id: self.youtube_id,
            home_team_name: self.home_team_name,
            away_team_name: self.away_team_name,
            date: self.date.to_system_time(),
            players: self.players,
            events: self.events,
            created_at: self.created_at.to_system_time(),
            updated_at: self.updated_at.to_system_time(),
        })
    }

    pub fn into_summary(self) -> MongoResult<MatchSummaryEntity> {
        self.into_entity().map(Into::into)
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn external_id_filter(youtube_id: &str) -> Document {
    doc! {"youtube_id": youtube_id}
}
