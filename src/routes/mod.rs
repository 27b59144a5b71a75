use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod matches;
pub mod setup;
pub mod sse;
pub mod tracking;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(setup::router())
        .merge(tracking::router())
        .merge(matches::router())
        .merge(docs::router());

    api_router.with_state(state)
}

/// Top-level router with cross-cutting middleware layers attached.
pub fn app(state: SharedState) -> Router<()> {
    router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
