use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a tracking session is open.
    pub tracking: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(tracking: bool) -> Self {
        Self {
            status: "ok".to_string(),
            tracking,
        }
    }

    /// Create a health response indicating the match store is unreachable.
    pub fn degraded(tracking: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            tracking,
        }
    }
}
