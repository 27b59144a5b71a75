//! Player payloads shared by the setup and tracking APIs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::state::roster::{Player, PlayerPatch, TeamSide};

/// Roster entry as exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlayerView {
    pub id: Uuid,
    pub name: String,
    pub number: u16,
    pub team: TeamSide,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            number: player.number,
            team: player.team,
        }
    }
}

/// Form submitted by the "add player" button.
///
/// `number` is the raw text of the shirt number field; a blank name or number
/// leaves the roster untouched.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddPlayerRequest {
    #[validate(length(max = 100))]
    pub name: String,
    #[validate(length(max = 5))]
    pub number: String,
    pub team: TeamSide,
}

/// Partial edit of a roster entry.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditPlayerRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<u16>,
    #[serde(default)]
    pub team: Option<TeamSide>,
}

impl From<EditPlayerRequest> for PlayerPatch {
    fn from(value: EditPlayerRequest) -> Self {
        Self {
            name: value.name,
            number: value.number,
            team: value.team,
        }
    }
}
