use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the match tracker backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::stream,
        crate::routes::setup::get_setup,
        crate::routes::setup::update_setup,
        crate::routes::setup::reset_setup,
        crate::routes::setup::add_player,
        crate::routes::setup::edit_player,
        crate::routes::setup::remove_player,
        crate::routes::setup::start_tracking,
        crate::routes::tracking::get_session,
        crate::routes::tracking::end_session,
        crate::routes::tracking::save_session,
        crate::routes::tracking::update_selection,
        crate::routes::tracking::get_playback,
        crate::routes::tracking::report_playback,
        crate::routes::tracking::track_event,
        crate::routes::tracking::edit_event,
        crate::routes::tracking::delete_event,
        crate::routes::tracking::add_player,
        crate::routes::tracking::edit_player,
        crate::routes::tracking::remove_player,
        crate::routes::matches::list_matches,
        crate::routes::matches::lookup_match,
        crate::routes::matches::get_match,
        crate::routes::matches::match_events,
        crate::routes::matches::event_types,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::MatchSavedEvent,
            crate::dto::sse::MatchSaveFailedEvent,
            crate::dto::sse::PlaybackPausedEvent,
            crate::dto::roster::PlayerView,
            crate::dto::roster::AddPlayerRequest,
            crate::dto::roster::EditPlayerRequest,
            crate::dto::setup::SetupResponse,
            crate::dto::setup::UpdateSetupRequest,
            crate::dto::tracking::EventView,
            crate::dto::tracking::TrackingSessionResponse,
            crate::dto::tracking::SelectionRequest,
            crate::dto::tracking::TrackEventRequest,
            crate::dto::tracking::EditEventRequest,
            crate::dto::tracking::PlaybackReportRequest,
            crate::dto::tracking::PlaybackResponse,
            crate::dto::tracking::RemovePlayerResponse,
            crate::dto::tracking::SaveResponse,
            crate::dto::tracking::EndSessionResponse,
            crate::dto::matches::StoredPlayer,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::StoredEvent,
            crate::dto::matches::MatchDetail,
            crate::dto::matches::EventTypeView,
            crate::state::roster::TeamSide,
            crate::state::tracking::EventType,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "setup", description = "Match setup draft and roster"),
        (name = "tracking", description = "Live event tagging against the video"),
        (name = "matches", description = "Stored matches and event catalogue"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_tree() {
        let doc = ApiDoc::openapi();
        for path in ["/healthcheck", "/sse", "/setup/start", "/tracking/events/{id}", "/event-types"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
