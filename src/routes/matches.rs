use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::matches::{EventTypeView, MatchDetail, MatchLookupQuery, MatchSummary, StoredEvent},
    error::{AppError, ServiceError},
    services::gateway,
    state::{SharedState, tracking::EventType},
};

/// Read-only access to stored matches plus the event type catalogue.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches))
        .route("/matches/lookup", get(lookup_match))
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/events", get(match_events))
        .route("/event-types", get(event_types))
}

#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    responses(
        (status = 200, description = "Stored matches, most recently saved first", body = [MatchSummary]),
        (status = 503, description = "Match store unavailable")
    )
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    let summaries = gateway::list_matches(&state).await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

/// Find the match stored for an external video id.
#[utoipa::path(
    get,
    path = "/matches/lookup",
    tag = "matches",
    params(("youtube_id" = String, Query, description = "External video id")),
    responses(
        (status = 200, description = "Stored match", body = MatchDetail),
        (status = 400, description = "Malformed video id"),
        (status = 404, description = "No match for this video")
    )
)]
pub async fn lookup_match(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<MatchLookupQuery>>,
) -> Result<Json<MatchDetail>, AppError> {
    let found = gateway::find_by_external_id(&state, query.youtube_id.trim())
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("no match stored for video `{}`", query.youtube_id))
        })?;
    Ok(Json(found.into()))
}

#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Stored match", body = MatchDetail),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchDetail>, AppError> {
    Ok(Json(gateway::get_match(&state, id).await?.into()))
}

/// Events embedded in a stored match.
#[utoipa::path(
    get,
    path = "/matches/{id}/events",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Events of the match", body = [StoredEvent]),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn match_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StoredEvent>>, AppError> {
    let events = gateway::events_for(&state, id).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/event-types",
    tag = "matches",
    responses((status = 200, description = "Taggable event types", body = [EventTypeView]))
)]
pub async fn event_types() -> Json<Vec<EventTypeView>> {
    Json(EventType::ALL.into_iter().map(Into::into).collect())
}
