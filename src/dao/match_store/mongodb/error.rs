use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("a match for video `{youtube_id}` already exists")]
    DuplicateExternalId { youtube_id: String },
    #[error("failed to insert match for video `{youtube_id}`")]
    InsertMatch {
        youtube_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to replace match `{id}`")]
    ReplaceMatch {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load match `{id}`")]
    LoadMatch {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to look up match for video `{youtube_id}`")]
    LoadByExternalId {
        youtube_id: String,
        #[source]
        source: MongoError,
    },
    #[error("stored match document `{doc_id}` has an invalid identifier")]
    InvalidDocId { doc_id: String },
    #[error("failed to list matches")]
    ListMatches {
        #[source]
        source: MongoError,
    },
}
