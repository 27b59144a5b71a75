#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{MatchEntity, MatchEventEntity, MatchRecord, MatchSummaryEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the document database holding matches and their embedded events.
///
/// Implementations must reject a second match carrying an already stored
/// `youtube_id` with [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict).
pub trait MatchStore: Send + Sync {
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn find_by_external_id(
        &self,
        youtube_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Insert a new match and return the identifier assigned to it.
    fn insert_match(
        &self,
        record: MatchRecord,
        events: Vec<MatchEventEntity>,
    ) -> BoxFuture<'static, StorageResult<Uuid>>;
    /// Replace an existing match document in place.
    fn replace_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchSummaryEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
