use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::{MatchEntity, MatchEventEntity, MatchSummaryEntity, PlayerEntity};

/// Every match document id starts with this prefix followed by the video id.
pub const VIDEO_PREFIX: &str = "video::";
/// Upper bound for `_all_docs` range scans over the prefix.
pub const END_SUFFIX: &str = "\u{ffff}";
/// Name of the Mango index over `match_id`.
pub const MATCH_ID_INDEX: &str = "match-id";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Response of a Mango `_find` query.
#[derive(Debug, Deserialize)]
pub struct FindResponse {
    pub docs: Vec<CouchMatchDocument>,
}

/// One match per video: the document id is `video::<youtube_id>`, so CouchDB's
/// own `_id` uniqueness rejects a second match for the same video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchMatchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Identifier exposed by the API, stable across replaces.
    pub match_id: Uuid,
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub date: SystemTime,
    pub players: Vec<PlayerEntity>,
    #[serde(default)]
    pub events: Vec<MatchEventEntity>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl CouchMatchDocument {
    pub fn new(entity: MatchEntity, rev: Option<String>) -> Self {
        Self {
            id: video_doc_id(&entity.youtube_id),
            rev,
            match_id: entity.id,
            youtube_id: entity.youtube_id,
            home_team_name: entity.home_team_name,
            away_team_name: entity.away_team_name,
            date: entity.date,
            players: entity.players,
            events: entity.events,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<CouchMatchDocument> for MatchEntity {
    fn from(doc: CouchMatchDocument) -> Self {
        Self {
            id: doc.match_id,
            youtube_id: doc.youtube_id,
            home_team_name: doc.home_team_name,
            away_team_name: doc.away_team_name,
            date: doc.date,
            players: doc.players,
            events: doc.events,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<CouchMatchDocument> for MatchSummaryEntity {
    fn from(doc: CouchMatchDocument) -> Self {
        MatchEntity::from(doc).into()
    }
}

pub fn video_doc_id(youtube_id: &str) -> String {
    format!("{VIDEO_PREFIX}{youtube_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::MatchRecord;

    #[test]
    fn document_is_keyed_by_video() {
        let id = Uuid::new_v4();
        let entity = MatchEntity::from_record(
            id,
            MatchRecord {
                youtube_id: "dQw4w9WgXcQ".into(),
                home_team_name: "Rovers".into(),
                away_team_name: "United".into(),
                date: SystemTime::now(),
                players: Vec::new(),
            },
            Vec::new(),
        );

        let doc = CouchMatchDocument::new(entity, None);
        assert_eq!(doc.id, "video::dQw4w9WgXcQ");
        assert_eq!(doc.match_id, id);

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("_rev").is_none());
        assert_eq!(MatchEntity::from(doc).id, id);
    }
}
