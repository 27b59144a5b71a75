use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{roster::PlayerView, validation::validate_youtube_id},
    state::setup::{MatchSetup, SetupError, SetupHeaderPatch},
};

/// Current setup draft together with the tracking gate outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetupResponse {
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub players: Vec<PlayerView>,
    /// Whether tracking can be started with this draft.
    pub ready: bool,
    /// Fields still blocking the start of tracking.
    pub missing: Vec<String>,
}

impl SetupResponse {
    pub fn new(setup: &MatchSetup, min_players: usize) -> Self {
        let missing = match setup.ready(min_players) {
            Ok(_) => Vec::new(),
            Err(SetupError::Incomplete { missing, .. }) => {
                missing.into_iter().map(str::to_string).collect()
            }
        };

        Self {
            youtube_id: setup.youtube_id.clone(),
            home_team_name: setup.home_team_name.clone(),
            away_team_name: setup.away_team_name.clone(),
            players: setup.roster.players().iter().map(PlayerView::from).collect(),
            ready: missing.is_empty(),
            missing,
        }
    }
}

/// Partial edit of the match header; omitted fields keep their value.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateSetupRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_youtube_id"))]
    pub youtube_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub home_team_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub away_team_name: Option<String>,
}

impl From<UpdateSetupRequest> for SetupHeaderPatch {
    fn from(value: UpdateSetupRequest) -> Self {
        Self {
            youtube_id: value.youtube_id,
            home_team_name: value.home_team_name,
            away_team_name: value.away_team_name,
        }
    }
}
