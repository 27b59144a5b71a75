use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse",
    tag = "sse",
    responses((status = 200, description = "Notification stream (match.saved, match.save_failed, playback.paused, system.status)", content_type = "text/event-stream", body = String))
)]
/// Stream save outcomes, pause notifications and degraded mode changes.
pub async fn stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    let handshake = sse_service::handshake(&state).await;
    info!("New SSE connection");
    sse_service::to_sse_stream(receiver, handshake)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse", get(stream))
}
