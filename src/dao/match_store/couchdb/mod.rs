mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchMatchStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::DuplicateExternalId { youtube_id } => StorageError::conflict(format!(
                "a match for video `{youtube_id}` already exists"
            )),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
