use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report degraded mode and ping the match store when one is installed.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.match_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "match store health check failed");
            }
        }
        None => warn!("match store unavailable (degraded mode)"),
    }

    let tracking = state.tracking().read().await.is_some();
    if state.is_degraded() {
        HealthResponse::degraded(tracking)
    } else {
        HealthResponse::ok(tracking)
    }
}
