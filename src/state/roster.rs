//! Match roster shared by the setup draft and the tracking session.
//!
//! Players are kept in insertion order; ids are assigned on add and never reused.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{PlayerEntity, TeamSideEntity};

/// Side of the pitch a player belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    /// Team listed first in the match header.
    Home,
    /// Visiting team.
    Away,
}

/// Roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Identifier referenced by tagged events.
    pub id: Uuid,
    /// Display name, trimmed.
    pub name: String,
    /// Shirt number.
    pub number: u16,
    /// Side the player belongs to.
    pub team: TeamSide,
}

/// Replacement values for a roster entry; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct PlayerPatch {
    /// New name; a blank value is rejected.
    pub name: Option<String>,
    /// New shirt number.
    pub number: Option<u16>,
    /// New side.
    pub team: Option<TeamSide>,
}

/// Roster edits that cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    /// No player carries this id.
    #[error("player `{0}` is not on the roster")]
    UnknownPlayer(Uuid),
    /// The shirt number field holds something other than a number.
    #[error("`{0}` is not a valid shirt number")]
    InvalidNumber(String),
    /// An edit tried to clear the player's name.
    #[error("player name must not be empty")]
    BlankName,
}

/// Ordered list of players taking part in a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Roster holding `players` in the given order.
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    /// Players in insertion order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Number of players on both sides.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no player has been added yet.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Player with id `id`, if present.
    pub fn get(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Append a player with a fresh identifier.
    ///
    /// Returns `Ok(None)` without touching the roster when the name or the
    /// number is blank, mirroring an add button pressed on an incomplete form.
    /// The number is only parsed once the name is known to be present.
    pub fn add(
        &mut self,
        name: &str,
        number: &str,
        team: TeamSide,
    ) -> Result<Option<&Player>, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let Some(number) = parse_shirt_number(number)? else {
            return Ok(None);
        };

        self.players.push(Player {
            id: Uuid::new_v4(),
            name: name.to_string(),
            number,
            team,
        });
        Ok(self.players.last())
    }

    /// Remove player `id`; events referencing it are the caller's concern.
    pub fn remove(&mut self, id: Uuid) -> Option<Player> {
        let index = self.players.iter().position(|player| player.id == id)?;
        Some(self.players.remove(index))
    }

    /// Apply `patch` to player `id`.
    pub fn edit(&mut self, id: Uuid, patch: PlayerPatch) -> Result<&Player, RosterError> {
        let name = match patch.name {
            Some(name) if name.trim().is_empty() => return Err(RosterError::BlankName),
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };

        let player = self
            .players
            .iter_mut()
            .find(|player| player.id == id)
            .ok_or(RosterError::UnknownPlayer(id))?;

        if let Some(name) = name {
            player.name = name;
        }
        if let Some(number) = patch.number {
            player.number = number;
        }
        if let Some(team) = patch.team {
            player.team = team;
        }
        Ok(player)
    }

    /// Players of one side, in roster order.
    pub fn by_team(&self, team: TeamSide) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |player| player.team == team)
    }
}

/// Parse the shirt number typed in a form field; blank input yields `None`.
pub fn parse_shirt_number(text: &str) -> Result<Option<u16>, RosterError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u16>()
        .map(Some)
        .map_err(|_| RosterError::InvalidNumber(trimmed.to_string()))
}

impl From<TeamSideEntity> for TeamSide {
    fn from(value: TeamSideEntity) -> Self {
        match value {
            TeamSideEntity::Home => TeamSide::Home,
            TeamSideEntity::Away => TeamSide::Away,
        }
    }
}

impl From<TeamSide> for TeamSideEntity {
    fn from(value: TeamSide) -> Self {
        match value {
            TeamSide::Home => TeamSideEntity::Home,
            TeamSide::Away => TeamSideEntity::Away,
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            number: value.number,
            team: value.team.into(),
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            name: value.name,
            number: value.number,
            team: value.team.into(),
        }
    }
}

impl From<Vec<PlayerEntity>> for Roster {
    fn from(value: Vec<PlayerEntity>) -> Self {
        Self::new(value.into_iter().map(Into::into).collect())
    }
}

impl From<Roster> for Vec<PlayerEntity> {
    fn from(value: Roster) -> Self {
        value.players.into_iter().map(Into::into).collect()
    }
}
