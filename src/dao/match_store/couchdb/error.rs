//! Failures raised by the CouchDB match store.

use reqwest::StatusCode;
use thiserror::Error;

pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Errors surfaced by [`super::CouchMatchStore`]; converted to a storage
/// error before leaving the DAO layer.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("invalid CouchDB server URL `{url}`: {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// Transport failure, or a body that did not decode.
    #[error("CouchDB request to `{path}` failed")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Status the store has no mapping for.
    #[error("unexpected CouchDB status {status} for `{path}`")]
    Status { path: String, status: StatusCode },
    /// A replace lost against a newer revision of the same video document.
    #[error("CouchDB document `{path}` was updated concurrently")]
    RevisionConflict { path: String },
    /// Insert hit an existing `video::` document.
    #[error("a match for video `{youtube_id}` already exists")]
    DuplicateExternalId { youtube_id: String },
    #[error("malformed CouchDB document `{path}`")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
