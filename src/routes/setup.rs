use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        roster::{AddPlayerRequest, EditPlayerRequest},
        setup::{SetupResponse, UpdateSetupRequest},
        tracking::TrackingSessionResponse,
    },
    error::AppError,
    services::{setup_service, tracking_service},
    state::{SharedState, setup::MatchSetup},
};

/// Setup screen endpoints: match header, roster, and the tracking gate.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/setup",
            get(get_setup).patch(update_setup).delete(reset_setup),
        )
        .route("/setup/players", post(add_player))
        .route(
            "/setup/players/{id}",
            patch(edit_player).delete(remove_player),
        )
        .route("/setup/start", post(start_tracking))
}

fn respond(state: &SharedState, setup: &MatchSetup) -> Json<SetupResponse> {
    Json(SetupResponse::new(setup, state.config().min_players))
}

/// Return the persisted setup draft.
#[utoipa::path(
    get,
    path = "/setup",
    tag = "setup",
    responses((status = 200, description = "Current setup draft", body = SetupResponse))
)]
pub async fn get_setup(State(state): State<SharedState>) -> Result<Json<SetupResponse>, AppError> {
    let setup = setup_service::load(&state).await?;
    Ok(respond(&state, &setup))
}

/// Edit the video id and team names; omitted fields are kept.
#[utoipa::path(
    patch,
    path = "/setup",
    tag = "setup",
    request_body = UpdateSetupRequest,
    responses(
        (status = 200, description = "Updated setup draft", body = SetupResponse),
        (status = 400, description = "Invalid video id or team name")
    )
)]
pub async fn update_setup(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateSetupRequest>>,
) -> Result<Json<SetupResponse>, AppError> {
    let setup = setup_service::update_match(&state, payload.into()).await?;
    Ok(respond(&state, &setup))
}

/// Discard the setup draft.
#[utoipa::path(
    delete,
    path = "/setup",
    tag = "setup",
    responses((status = 200, description = "Empty setup draft", body = SetupResponse))
)]
pub async fn reset_setup(
    State(state): State<SharedState>,
) -> Result<Json<SetupResponse>, AppError> {
    let setup = setup_service::reset(&state).await?;
    Ok(respond(&state, &setup))
}

/// Add a player to the roster. Blank name or number leaves the roster as is.
#[utoipa::path(
    post,
    path = "/setup/players",
    tag = "setup",
    request_body = AddPlayerRequest,
    responses(
        (status = 200, description = "Updated setup draft", body = SetupResponse),
        (status = 400, description = "Shirt number is not a number")
    )
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AddPlayerRequest>>,
) -> Result<Json<SetupResponse>, AppError> {
    let setup =
        setup_service::add_player(&state, &payload.name, &payload.number, payload.team).await?;
    Ok(respond(&state, &setup))
}

#[utoipa::path(
    patch,
    path = "/setup/players/{id}",
    tag = "setup",
    params(("id" = Uuid, Path, description = "Identifier of the player")),
    request_body = EditPlayerRequest,
    responses(
        (status = 200, description = "Updated setup draft", body = SetupResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn edit_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<EditPlayerRequest>>,
) -> Result<Json<SetupResponse>, AppError> {
    let setup = setup_service::edit_player(&state, id, payload.into()).await?;
    Ok(respond(&state, &setup))
}

#[utoipa::path(
    delete,
    path = "/setup/players/{id}",
    tag = "setup",
    params(("id" = Uuid, Path, description = "Identifier of the player")),
    responses(
        (status = 200, description = "Updated setup draft", body = SetupResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn remove_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SetupResponse>, AppError> {
    let setup = setup_service::remove_player(&state, id).await?;
    Ok(respond(&state, &setup))
}

/// Validate the draft and open the tracking session.
#[utoipa::path(
    post,
    path = "/setup/start",
    tag = "setup",
    responses(
        (status = 201, description = "Tracking session opened", body = TrackingSessionResponse),
        (status = 400, description = "Setup is incomplete"),
        (status = 409, description = "A tracking session is already open")
    )
)]
pub async fn start_tracking(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<TrackingSessionResponse>), AppError> {
    let session = setup_service::start_tracking(&state).await?;
    let now = tracking_service::current_time(&state).await;
    Ok((
        StatusCode::CREATED,
        Json(TrackingSessionResponse::new(&session, now)),
    ))
}
