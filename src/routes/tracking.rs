use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        roster::{AddPlayerRequest, EditPlayerRequest, PlayerView},
        tracking::{
            EditEventRequest, EndSessionQuery, EndSessionResponse, EventView,
            PlaybackReportRequest, PlaybackResponse, RemovePlayerQuery, RemovePlayerResponse,
            SaveResponse, SelectionRequest, TrackEventRequest, TrackingSessionResponse,
        },
    },
    error::AppError,
    services::tracking_service,
    state::{SharedState, timecode},
};

/// Tracking screen endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/tracking", get(get_session))
        .route("/tracking/end", post(end_session))
        .route("/tracking/save", post(save_session))
        .route("/tracking/selection", put(update_selection))
        .route("/tracking/playback", get(get_playback).post(report_playback))
        .route("/tracking/events", post(track_event))
        .route("/tracking/events/{id}", patch(edit_event).delete(delete_event))
        .route("/tracking/players", post(add_player))
        .route(
            "/tracking/players/{id}",
            patch(edit_player).delete(remove_player),
        )
}

async fn snapshot(state: &SharedState) -> Result<Json<TrackingSessionResponse>, AppError> {
    let session = tracking_service::session(state).await?;
    let now = tracking_service::current_time(state).await;
    Ok(Json(TrackingSessionResponse::new(&session, now)))
}

/// Return the open tracking session.
#[utoipa::path(
    get,
    path = "/tracking",
    tag = "tracking",
    responses(
        (status = 200, description = "Open tracking session", body = TrackingSessionResponse),
        (status = 409, description = "No tracking session is open")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
) -> Result<Json<TrackingSessionResponse>, AppError> {
    snapshot(&state).await
}

/// Close the tracking session, saving it first unless `save=false`.
#[utoipa::path(
    post,
    path = "/tracking/end",
    tag = "tracking",
    params(("save" = Option<bool>, Query, description = "Save before closing (default true)")),
    responses(
        (status = 200, description = "Session closed", body = EndSessionResponse),
        (status = 503, description = "Save failed; the session stays open")
    )
)]
pub async fn end_session(
    State(state): State<SharedState>,
    Query(query): Query<EndSessionQuery>,
) -> Result<Json<EndSessionResponse>, AppError> {
    let match_id = tracking_service::end(&state, query.save).await?;
    Ok(Json(EndSessionResponse { match_id }))
}

/// Save the session immediately.
#[utoipa::path(
    post,
    path = "/tracking/save",
    tag = "tracking",
    responses(
        (status = 200, description = "Session saved", body = SaveResponse),
        (status = 503, description = "Match store unavailable")
    )
)]
pub async fn save_session(State(state): State<SharedState>) -> Result<Json<SaveResponse>, AppError> {
    let match_id = tracking_service::save_now(&state).await?;
    Ok(Json(SaveResponse { match_id }))
}

/// Replace the selected player and event type.
#[utoipa::path(
    put,
    path = "/tracking/selection",
    tag = "tracking",
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Updated session", body = TrackingSessionResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn update_selection(
    State(state): State<SharedState>,
    Json(payload): Json<SelectionRequest>,
) -> Result<Json<TrackingSessionResponse>, AppError> {
    tracking_service::select(&state, payload.player_id, payload.event_type).await?;
    snapshot(&state).await
}

fn playback_response(current_time: Option<f64>) -> Json<PlaybackResponse> {
    Json(PlaybackResponse {
        current_time,
        time_string: current_time.map(timecode::format),
    })
}

#[utoipa::path(
    get,
    path = "/tracking/playback",
    tag = "tracking",
    responses((status = 200, description = "Latest playback position", body = PlaybackResponse))
)]
pub async fn get_playback(State(state): State<SharedState>) -> Json<PlaybackResponse> {
    playback_response(tracking_service::current_time(&state).await)
}

/// Report the embedded player's position; a paused report is broadcast.
#[utoipa::path(
    post,
    path = "/tracking/playback",
    tag = "tracking",
    request_body = PlaybackReportRequest,
    responses((status = 200, description = "Position recorded", body = PlaybackResponse))
)]
pub async fn report_playback(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PlaybackReportRequest>>,
) -> Result<Json<PlaybackResponse>, AppError> {
    let now =
        tracking_service::report_playback(&state, payload.current_time, payload.paused).await?;
    Ok(playback_response(Some(now)))
}

/// Tag the selected player with the selected event type.
#[utoipa::path(
    post,
    path = "/tracking/events",
    tag = "tracking",
    request_body = TrackEventRequest,
    responses(
        (status = 201, description = "Event tagged", body = EventView),
        (status = 400, description = "Selection incomplete or playback position unknown")
    )
)]
pub async fn track_event(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<TrackEventRequest>>,
) -> Result<(StatusCode, Json<EventView>), AppError> {
    let event = tracking_service::track_event(&state, payload.current_time).await?;
    let match_id = tracking_service::session(&state).await?.match_id;
    Ok((StatusCode::CREATED, Json(EventView::new(&event, match_id))))
}

#[utoipa::path(
    patch,
    path = "/tracking/events/{id}",
    tag = "tracking",
    params(("id" = Uuid, Path, description = "Identifier of the event")),
    request_body = EditEventRequest,
    responses(
        (status = 200, description = "Edited event", body = EventView),
        (status = 400, description = "Invalid time or both time fields given"),
        (status = 404, description = "Unknown event or player")
    )
)]
pub async fn edit_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<EditEventRequest>>,
) -> Result<Json<EventView>, AppError> {
    let event = tracking_service::edit_event(&state, id, payload.into()).await?;
    let match_id = tracking_service::session(&state).await?.match_id;
    Ok(Json(EventView::new(&event, match_id)))
}

#[utoipa::path(
    delete,
    path = "/tracking/events/{id}",
    tag = "tracking",
    params(("id" = Uuid, Path, description = "Identifier of the event")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn delete_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    tracking_service::delete_event(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a player during the match.
#[utoipa::path(
    post,
    path = "/tracking/players",
    tag = "tracking",
    request_body = AddPlayerRequest,
    responses(
        (status = 201, description = "Player added", body = PlayerView),
        (status = 204, description = "Blank name or number; nothing added")
    )
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AddPlayerRequest>>,
) -> Result<Response, AppError> {
    let added =
        tracking_service::add_player(&state, &payload.name, &payload.number, payload.team).await?;
    Ok(match added {
        Some(player) => (StatusCode::CREATED, Json(PlayerView::from(&player))).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Edit a player; their tagged events pick up the new name and number.
#[utoipa::path(
    patch,
    path = "/tracking/players/{id}",
    tag = "tracking",
    params(("id" = Uuid, Path, description = "Identifier of the player")),
    request_body = EditPlayerRequest,
    responses(
        (status = 200, description = "Edited player", body = PlayerView),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn edit_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<EditPlayerRequest>>,
) -> Result<Json<PlayerView>, AppError> {
    let player = tracking_service::edit_player(&state, id, payload.into()).await?;
    Ok(Json(PlayerView::from(&player)))
}

/// Remove a player and their events; needs `confirm=true` when events exist.
#[utoipa::path(
    delete,
    path = "/tracking/players/{id}",
    tag = "tracking",
    params(
        ("id" = Uuid, Path, description = "Identifier of the player"),
        ("confirm" = Option<bool>, Query, description = "Confirm deleting the player's events")
    ),
    responses(
        (status = 200, description = "Player removed", body = RemovePlayerResponse),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Player has events and removal was not confirmed")
    )
)]
pub async fn remove_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RemovePlayerQuery>,
) -> Result<Json<RemovePlayerResponse>, AppError> {
    let removed = tracking_service::remove_player(&state, id, query.confirm).await?;
    Ok(Json(RemovePlayerResponse {
        player: PlayerView::from(&removed.player),
        removed_events: removed.removed_events.len(),
    }))
}
