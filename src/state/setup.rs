//! Setup screen state: the video, the two team names and the roster that
//! must be complete before tracking can start.

use thiserror::Error;

use crate::{
    dao::models::SetupDraftEntity,
    state::roster::{Player, Roster},
};

/// Message shown when the setup form cannot start tracking yet.
pub const INCOMPLETE_SETUP_MESSAGE: &str =
    "please fill in the video id and both team names, and add at least two players";

/// Setup form state: video reference, team names and roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSetup {
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub roster: Roster,
}

/// Partial edit of the setup header fields.
#[derive(Debug, Clone, Default)]
pub struct SetupHeaderPatch {
    pub youtube_id: Option<String>,
    pub home_team_name: Option<String>,
    pub away_team_name: Option<String>,
}

/// Snapshot of a complete setup, ready to be tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadySetup {
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub players: Vec<Player>,
}

/// Reasons the setup screen cannot be left.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// Some required fields are empty; `missing` names them.
    #[error("{message}")]
    Incomplete {
        message: &'static str,
        missing: Vec<&'static str>,
    },
}

impl MatchSetup {
    /// Overwrite the header fields present in `patch`. The video id is trimmed.
    pub fn apply_header(&mut self, patch: SetupHeaderPatch) {
        if let Some(youtube_id) = patch.youtube_id {
            self.youtube_id = youtube_id.trim().to_string();
        }
        if let Some(name) = patch.home_team_name {
            self.home_team_name = name;
        }
        if let Some(name) = patch.away_team_name {
            self.away_team_name = name;
        }
    }

    /// Check the gate for leaving the setup screen.
    pub fn ready(&self, min_players: usize) -> Result<ReadySetup, SetupError> {
        let mut missing = Vec::new();
        if self.youtube_id.trim().is_empty() {
            missing.push("youtube_id");
        }
        if self.home_team_name.trim().is_empty() {
            missing.push("home_team_name");
        }
        if self.away_team_name.trim().is_empty() {
            missing.push("away_team_name");
        }
        if self.roster.len() < min_players {
            missing.push("players");
        }

        if !missing.is_empty() {
            return Err(SetupError::Incomplete {
                message: INCOMPLETE_SETUP_MESSAGE,
                missing,
            });
        }

        Ok(ReadySetup {
            youtube_id: self.youtube_id.trim().to_string(),
            home_team_name: self.home_team_name.trim().to_string(),
            away_team_name: self.away_team_name.trim().to_string(),
            players: self.roster.players().to_vec(),
        })
    }
}

impl From<SetupDraftEntity> for MatchSetup {
    fn from(value: SetupDraftEntity) -> Self {
        Self {
            youtube_id: value.youtube_id,
            home_team_name: value.home_team_name,
            away_team_name: value.away_team_name,
            roster: value.players.into(),
        }
    }
}

impl From<MatchSetup> for SetupDraftEntity {
    fn from(value: MatchSetup) -> Self {
        Self {
            youtube_id: value.youtube_id,
            home_team_name: value.home_team_name,
            away_team_name: value.away_team_name,
            players: value.roster.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::roster::TeamSide;

    fn filled_setup() -> MatchSetup {
        let mut setup = MatchSetup::default();
        setup.apply_header(SetupHeaderPatch {
            youtube_id: Some(" abc123 ".into()),
            home_team_name: Some("Rovers".into()),
            away_team_name: Some("United".into()),
        });
        setup.roster.add("Ada", "10", TeamSide::Home).unwrap();
        setup.roster.add("Bea", "7", TeamSide::Away).unwrap();
        setup
    }

    #[test]
    fn complete_setup_is_ready() {
        let ready = filled_setup().ready(2).unwrap();
        assert_eq!(ready.youtube_id, "abc123");
        assert_eq!(ready.players.len(), 2);
    }

    #[test]
    fn gate_lists_every_missing_field() {
        let err = MatchSetup::default().ready(2).unwrap_err();
        let SetupError::Incomplete { missing, .. } = err;
        assert_eq!(
            missing,
            vec!["youtube_id", "home_team_name", "away_team_name", "players"]
        );
    }

    #[test]
    fn gate_requires_two_players() {
        let mut setup = filled_setup();
        let id = setup.roster.players()[0].id;
        setup.roster.remove(id);
        assert!(setup.ready(2).is_err());
    }

    #[test]
    fn whitespace_team_name_counts_as_missing() {
        let mut setup = filled_setup();
        setup.apply_header(SetupHeaderPatch {
            away_team_name: Some("  ".into()),
            ..SetupHeaderPatch::default()
        });
        assert!(setup.ready(2).is_err());
    }

    #[test]
    fn draft_entity_conversion_keeps_roster() {
        let setup = filled_setup();
        let entity: SetupDraftEntity = setup.clone().into();
        assert_eq!(entity.players.len(), 2);
        assert_eq!(MatchSetup::from(entity), setup);
    }
}
