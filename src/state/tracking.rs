//! Tracking screen state: the roster carried over from setup, the current
//! selection and the events tagged against the video timeline.

use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{MatchEventEntity, MatchRecord},
    state::{
        roster::{Player, PlayerPatch, Roster, RosterError, TeamSide},
        setup::ReadySetup,
        timecode,
    },
};

/// Kind of on-ball action that can be tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum EventType {
    Pass,
    #[serde(rename = "Bad pass")]
    BadPass,
    Receiving,
    #[serde(rename = "Bad receiving")]
    BadReceiving,
    #[serde(rename = "Shot on target")]
    ShotOnTarget,
    #[serde(rename = "Shot off target")]
    ShotOffTarget,
    Dribble,
    Goal,
    Assist,
    Defense,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        EventType::Pass,
        EventType::BadPass,
        EventType::Receiving,
        EventType::BadReceiving,
        EventType::ShotOnTarget,
        EventType::ShotOffTarget,
        EventType::Dribble,
        EventType::Goal,
        EventType::Assist,
        EventType::Defense,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EventType::Pass => "Pass",
            EventType::BadPass => "Bad pass",
            EventType::Receiving => "Receiving",
            EventType::BadReceiving => "Bad receiving",
            EventType::ShotOnTarget => "Shot on target",
            EventType::ShotOffTarget => "Shot off target",
            EventType::Dribble => "Dribble",
            EventType::Goal => "Goal",
            EventType::Assist => "Assist",
            EventType::Defense => "Defense",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EventType {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| TrackingError::UnknownEventType(s.to_string()))
    }
}

/// Event tagged against the video timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEvent {
    pub id: Uuid,
    /// Playback position in seconds.
    pub timestamp: f64,
    /// `timestamp` rendered as `M:SS`; may briefly hold a partially typed label.
    pub time_string: String,
    pub player_id: Uuid,
    pub player_name: String,
    pub player_number: u16,
    pub event_type: EventType,
    pub additional_data: Option<Value>,
}

/// Changes applied through the event edit dialog.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub time_string: Option<String>,
    pub timestamp: Option<f64>,
    pub player_id: Option<Uuid>,
    pub event_type: Option<EventType>,
    pub additional_data: Option<Value>,
}

/// Session edits that cannot be applied.
#[derive(Debug, Error, PartialEq)]
pub enum TrackingError {
    /// No event in the session carries this id.
    #[error("event `{0}` does not exist")]
    UnknownEvent(Uuid),
    /// The label does not match any [`EventType`].
    #[error("unknown event type `{0}`")]
    UnknownEventType(String),
    /// The time string is not `M:SS`.
    #[error("`{0}` is not a valid M:SS time")]
    InvalidTimeString(String),
    /// Negative, NaN or infinite timestamp.
    #[error("timestamp must be a non-negative number of seconds")]
    InvalidTimestamp,
    #[error("edit either the time string or the timestamp, not both")]
    AmbiguousTimeEdit,
    /// Removal needs confirmation because `events` events would go with it.
    #[error("player `{player_id}` has {events} tagged event(s); confirm to delete them too")]
    PlayerHasEvents { player_id: Uuid, events: usize },
    /// Roster edit rejected.
    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Player removed from a tracking session together with its events.
#[derive(Debug, Clone)]
pub struct RemovedPlayer {
    pub player: Player,
    pub removed_events: Vec<MatchEvent>,
}

/// In-memory state of the tracking screen.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    pub youtube_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub date: SystemTime,
    /// Internal id of the stored match once it has been saved or resumed.
    pub match_id: Option<Uuid>,
    roster: Roster,
    events: Vec<MatchEvent>,
    /// Stored events whose type this build does not know; written back untouched.
    preserved: Vec<MatchEventEntity>,
    selected_player: Option<Uuid>,
    selected_event_type: Option<EventType>,
}

impl TrackingSession {
    pub fn new(setup: ReadySetup) -> Self {
        Self {
            youtube_id: setup.youtube_id,
            home_team_name: setup.home_team_name,
            away_team_name: setup.away_team_name,
            date: SystemTime::now(),
            match_id: None,
            roster: Roster::new(setup.players),
            events: Vec::new(),
            preserved: Vec::new(),
            selected_player: None,
            selected_event_type: None,
        }
    }

    /// Adopt events previously stored for this match.
    ///
    /// Entries that cannot be decoded are kept aside and saved back as they
    /// were. Returns how many were kept aside.
    pub fn resume(&mut self, match_id: Uuid, stored: Vec<MatchEventEntity>) -> usize {
        self.match_id = Some(match_id);
        self.events.clear();
        self.preserved.clear();
        for entity in stored {
            match MatchEvent::try_from(entity.clone()) {
                Ok(event) => self.events.push(event),
                Err(_) => self.preserved.push(entity),
            }
        }
        self.preserved.len()
    }

    /// Stored events carried through without being editable.
    pub fn preserved_events(&self) -> &[MatchEventEntity] {
        &self.preserved
    }

    /// Roster, including players added during tracking.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Tagged events in tagging order.
    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.selected_player.and_then(|id| self.roster.get(id))
    }

    pub fn selected_event_type(&self) -> Option<EventType> {
        self.selected_event_type
    }

    /// Select a player to tag, or clear the selection with `None`.
    pub fn select_player(&mut self, player_id: Option<Uuid>) -> Result<(), TrackingError> {
        if let Some(id) = player_id
            && self.roster.get(id).is_none()
        {
            return Err(RosterError::UnknownPlayer(id).into());
        }
        self.selected_player = player_id;
        Ok(())
    }

    pub fn select_event_type(&mut self, event_type: Option<EventType>) {
        self.selected_event_type = event_type;
    }

    /// Tag the selected player with the selected event type at `current_time`.
    ///
    /// Returns `None` and leaves the session untouched unless both a player and
    /// an event type are selected. The event type selection is cleared after a
    /// successful tag while the player stays selected.
    pub fn track_event(&mut self, current_time: f64) -> Option<&MatchEvent> {
        let player = self.selected_player()?;
        let event_type = self.selected_event_type?;
        let timestamp = current_time.max(0.0);

        let event = MatchEvent {
            id: Uuid::new_v4(),
            timestamp,
            time_string: timecode::format(timestamp),
            player_id: player.id,
            player_name: player.name.clone(),
            player_number: player.number,
            event_type,
            additional_data: None,
        };

        self.events.push(event);
        self.selected_event_type = None;
        self.events.last()
    }

    pub fn edit_event(&mut self, id: Uuid, patch: EventPatch) -> Result<&MatchEvent, TrackingError> {
        if patch.time_string.is_some() && patch.timestamp.is_some() {
            return Err(TrackingError::AmbiguousTimeEdit);
        }

        let snapshot = match patch.player_id {
            Some(player_id) => {
                let player = self
                    .roster
                    .get(player_id)
                    .ok_or(RosterError::UnknownPlayer(player_id))?;
                Some((player.id, player.name.clone(), player.number))
            }
            None => None,
        };

        let event = self
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or(TrackingError::UnknownEvent(id))?;

        // Validate everything before mutating so a rejected edit changes nothing.
        let time_edit = match patch.time_string {
            Some(text) => match timecode::parse(&text) {
                Some(seconds) => Some((text, Some(seconds))),
                None if timecode::is_partial(&text) => Some((text, None)),
                None => return Err(TrackingError::InvalidTimeString(text)),
            },
            None => None,
        };
        if let Some(timestamp) = patch.timestamp
            && !(timestamp.is_finite() && timestamp >= 0.0)
        {
            return Err(TrackingError::InvalidTimestamp);
        }

        if let Some((text, seconds)) = time_edit {
            event.time_string = text;
            if let Some(seconds) = seconds {
                event.timestamp = seconds;
            }
        }
        if let Some(timestamp) = patch.timestamp {
            event.timestamp = timestamp;
            event.time_string = timecode::format(timestamp);
        }
        if let Some((player_id, name, number)) = snapshot {
            event.player_id = player_id;
            event.player_name = name;
            event.player_number = number;
        }
        if let Some(event_type) = patch.event_type {
            event.event_type = event_type;
        }
        if let Some(data) = patch.additional_data {
            event.additional_data = Some(data);
        }

        Ok(event)
    }

    /// Remove an event. Returns `None` for an unknown id.
    pub fn delete_event(&mut self, id: Uuid) -> Option<MatchEvent> {
        let index = self.events.iter().position(|event| event.id == id)?;
        Some(self.events.remove(index))
    }

    pub fn add_player(
        &mut self,
        name: &str,
        number: &str,
        team: TeamSide,
    ) -> Result<Option<&Player>, TrackingError> {
        Ok(self.roster.add(name, number, team)?)
    }

    /// Edit a roster entry and refresh the name/number snapshot of its events.
    pub fn edit_player(&mut self, id: Uuid, patch: PlayerPatch) -> Result<&Player, TrackingError> {
        let (name, number) = {
            let player = self.roster.edit(id, patch)?;
            (player.name.clone(), player.number)
        };
        self.resync_events_for_player(id, &name, number);
        self.roster.get(id).ok_or(TrackingError::Roster(RosterError::UnknownPlayer(id)))
    }

    /// Rewrite the denormalised player fields on every event of `player_id`.
    /// Returns the number of events touched.
    pub fn resync_events_for_player(&mut self, player_id: Uuid, name: &str, number: u16) -> usize {
        let mut touched = 0;
        for event in self.events.iter_mut().filter(|e| e.player_id == player_id) {
            event.player_name = name.to_string();
            event.player_number = number;
            touched += 1;
        }
        touched
    }

    pub fn event_count_for_player(&self, player_id: Uuid) -> usize {
        self.events
            .iter()
            .filter(|event| event.player_id == player_id)
            .count()
    }

    /// Remove a player and every event attributed to them.
    ///
    /// When the player already has events the removal only happens with
    /// `confirmed` set; otherwise [`TrackingError::PlayerHasEvents`] is returned
    /// and nothing changes.
    pub fn remove_player(
        &mut self,
        player_id: Uuid,
        confirmed: bool,
    ) -> Result<RemovedPlayer, TrackingError> {
        if self.roster.get(player_id).is_none() {
            return Err(RosterError::UnknownPlayer(player_id).into());
        }

        let events = self.event_count_for_player(player_id);
        if events > 0 && !confirmed {
            return Err(TrackingError::PlayerHasEvents { player_id, events });
        }

        let player = self
            .roster
            .remove(player_id)
            .ok_or(RosterError::UnknownPlayer(player_id))?;
        let (removed_events, kept) = std::mem::take(&mut self.events)
            .into_iter()
            .partition(|event| event.player_id == player_id);
        self.events = kept;

        if self.selected_player == Some(player_id) {
            self.selected_player = None;
        }

        Ok(RemovedPlayer {
            player,
            removed_events,
        })
    }

    /// Build the payload handed to the persistence gateway.
    pub fn to_record(&self) -> (MatchRecord, Vec<MatchEventEntity>) {
        let record = MatchRecord {
            youtube_id: self.youtube_id.clone(),
            home_team_name: self.home_team_name.clone(),
            away_team_name: self.away_team_name.clone(),
            date: self.date,
            players: self.roster.clone().into(),
        };
        let events = self
            .events
            .iter()
            .cloned()
            .map(|event| event.into_entity(self.match_id))
            .chain(self.preserved.iter().cloned().map(|mut entity| {
                entity.match_id = self.match_id;
                entity
            }))
            .collect();
        (record, events)
    }
}

impl MatchEvent {
    /// Stored form of the event, tagged with `match_id` when known.
    pub fn into_entity(self, match_id: Option<Uuid>) -> MatchEventEntity {
        MatchEventEntity {
            id: self.id,
            match_id,
            timestamp: self.timestamp,
            time_string: self.time_string,
            player_id: self.player_id,
            player_name: self.player_name,
            player_number: self.player_number,
            event_type: self.event_type.label().to_string(),
            additional_data: self.additional_data,
        }
    }
}

impl TryFrom<MatchEventEntity> for MatchEvent {
    type Error = TrackingError;

    fn try_from(value: MatchEventEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            timestamp: value.timestamp,
            time_string: value.time_string,
            player_id: value.player_id,
            player_name: value.player_name,
            player_number: value.player_number,
            event_type: value.event_type.parse()?,
            additional_data: value.additional_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        session: TrackingSession,
        ada: Uuid,
        bea: Uuid,
    }

    fn fixture() -> Fixture {
        let mut roster = Roster::default();
        let ada = roster.add("A", "10", TeamSide::Home).unwrap().unwrap().id;
        let bea = roster.add("B", "7", TeamSide::Away).unwrap().unwrap().id;
        let session = TrackingSession::new(ReadySetup {
            youtube_id: "abc123".into(),
            home_team_name: "Rovers".into(),
            away_team_name: "United".into(),
            players: roster.players().to_vec(),
        });
        Fixture { session, ada, bea }
    }

    fn tag(session: &mut TrackingSession, player: Uuid, kind: EventType, at: f64) -> Uuid {
        session.select_player(Some(player)).unwrap();
        session.select_event_type(Some(kind));
        session.track_event(at).unwrap().id
    }

    #[test]
    fn tagging_a_goal_snapshots_the_player() {
        let Fixture {
            mut session, ada, ..
        } = fixture();
        session.select_player(Some(ada)).unwrap();
        session.select_event_type(Some(EventType::Goal));

        let event = session.track_event(125.4).unwrap().clone();

        assert_eq!(event.timestamp, 125.4);
        assert_eq!(event.time_string, "2:05");
        assert_eq!(event.player_id, ada);
        assert_eq!(event.player_name, "A");
        assert_eq!(event.player_number, 10);
        assert_eq!(event.event_type, EventType::Goal);
        assert_eq!(session.selected_event_type(), None);
        assert_eq!(session.selected_player().map(|p| p.id), Some(ada));
    }

    #[test]
    fn tracking_without_full_selection_is_a_no_op() {
        let Fixture {
            mut session, ada, ..
        } = fixture();

        assert!(session.track_event(1.0).is_none());

        session.select_player(Some(ada)).unwrap();
        assert!(session.track_event(1.0).is_none());

        session.select_player(None).unwrap();
        session.select_event_type(Some(EventType::Pass));
        assert!(session.track_event(1.0).is_none());

        assert!(session.events().is_empty());
        assert_eq!(session.selected_event_type(), Some(EventType::Pass));
    }

    #[test]
    fn selecting_unknown_player_is_rejected() {
        let Fixture { mut session, .. } = fixture();
        assert!(session.select_player(Some(Uuid::new_v4())).is_err());
        assert!(session.selected_player().is_none());
    }

    #[test]
    fn editing_full_time_string_recomputes_timestamp() {
        let Fixture {
            mut session, ada, ..
        } = fixture();
        let id = tag(&mut session, ada, EventType::Pass, 10.0);

        let edited = session
            .edit_event(
                id,
                EventPatch {
                    time_string: Some("12:34".into()),
                    ..EventPatch::default()
                },
            )
            .unwrap();

        assert_eq!(edited.timestamp, 754.0);
        assert_eq!(edited.time_string, "12:34");
    }

    #[test]
    fn partial_time_string_keeps_timestamp() {
        let Fixture {
            mut session, ada, ..
        } = fixture();
        let id = tag(&mut session, ada, EventType::Pass, 10.0);

        let edited = session
            .edit_event(
                id,
                EventPatch {
                    time_string: Some("12:".into()),
                    ..EventPatch::default()
                },
            )
            .unwrap();

        assert_eq!(edited.time_string, "12:");
        assert_eq!(edited.timestamp, 10.0);
    }

    #[test]
    fn overlong_time_string_is_rejected_without_changes() {
        let Fixture {
            mut session, ada, bea,
        } = fixture();
        let id = tag(&mut session, ada, EventType::Pass, 10.0);

        let err = session
            .edit_event(
                id,
                EventPatch {
                    time_string: Some("123:45".into()),
                    player_id: Some(bea),
                    ..EventPatch::default()
                },
            )
            .unwrap_err();

        assert_eq!(err, TrackingError::InvalidTimeString("123:45".into()));
        let event = &session.events()[0];
        assert_eq!(event.time_string, "0:10");
        assert_eq!(event.player_id, ada);
    }

    #[test]
    fn editing_timestamp_recomputes_time_string() {
        let Fixture {
            mut session, ada, ..
        } = fixture();
        let id = tag(&mut session, ada, EventType::Pass, 10.0);

        let edited = session
            .edit_event(
                id,
                EventPatch {
                    timestamp: Some(61.9),
                    ..EventPatch::default()
                },
            )
            .unwrap();

        assert_eq!(edited.time_string, "1:01");
    }

    #[test]
    fn changing_event_player_refreshes_snapshot() {
        let Fixture {
            mut session, ada, bea,
        } = fixture();
        let id = tag(&mut session, ada, EventType::Dribble, 3.0);

        let edited = session
            .edit_event(
                id,
                EventPatch {
                    player_id: Some(bea),
                    event_type: Some(EventType::Defense),
                    ..EventPatch::default()
                },
            )
            .unwrap();

        assert_eq!(edited.player_name, "B");
        assert_eq!(edited.player_number, 7);
        assert_eq!(edited.event_type, EventType::Defense);
    }

    #[test]
    fn delete_event_removes_only_that_event() {
        let Fixture {
            mut session, ada, ..
        } = fixture();
        let first = tag(&mut session, ada, EventType::Pass, 1.0);
        let second = tag(&mut session, ada, EventType::Pass, 2.0);

        assert!(session.delete_event(first).is_some());
        assert!(session.delete_event(first).is_none());
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.events()[0].id, second);
    }

    #[test]
    fn removing_a_player_cascades_to_their_events_only() {
        let Fixture {
            mut session, ada, bea,
        } = fixture();
        tag(&mut session, ada, EventType::Pass, 1.0);
        let kept = tag(&mut session, bea, EventType::Receiving, 2.0);
        tag(&mut session, ada, EventType::Goal, 3.0);

        let err = session.remove_player(ada, false).unwrap_err();
        assert_eq!(
            err,
            TrackingError::PlayerHasEvents {
                player_id: ada,
                events: 2
            }
        );
        assert_eq!(session.events().len(), 3);

        let removed = session.remove_player(ada, true).unwrap();
        assert_eq!(removed.removed_events.len(), 2);
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.events()[0].id, kept);
        assert!(session.roster().get(ada).is_none());
        assert!(session.selected_player().is_none());
    }

    #[test]
    fn removing_a_player_without_events_needs_no_confirmation() {
        let Fixture {
            mut session, bea, ..
        } = fixture();
        assert!(session.remove_player(bea, false).is_ok());
    }

    #[test]
    fn editing_a_player_resyncs_only_their_events() {
        let Fixture {
            mut session, ada, bea,
        } = fixture();
        tag(&mut session, ada, EventType::Pass, 1.0);
        tag(&mut session, bea, EventType::Pass, 2.0);

        session
            .edit_player(
                ada,
                PlayerPatch {
                    name: Some("Alex".into()),
                    number: Some(11),
                    team: None,
                },
            )
            .unwrap();

        let ada_event = session.events().iter().find(|e| e.player_id == ada).unwrap();
        let bea_event = session.events().iter().find(|e| e.player_id == bea).unwrap();
        assert_eq!(ada_event.player_name, "Alex");
        assert_eq!(ada_event.player_number, 11);
        assert_eq!(bea_event.player_name, "B");
        assert_eq!(bea_event.player_number, 7);
    }

    #[test]
    fn record_carries_event_labels_and_match_id() {
        let Fixture {
            mut session, ada, ..
        } = fixture();
        tag(&mut session, ada, EventType::ShotOnTarget, 5.0);
        let match_id = Uuid::new_v4();
        let events = session.to_record().1;
        assert_eq!(session.resume(match_id, events), 0);

        let (record, events) = session.to_record();
        assert_eq!(record.youtube_id, "abc123");
        assert_eq!(record.players.len(), 2);
        assert_eq!(events[0].event_type, "Shot on target");
        assert_eq!(events[0].match_id, Some(match_id));

        let restored = MatchEvent::try_from(events[0].clone()).unwrap();
        assert_eq!(restored.event_type, EventType::ShotOnTarget);
    }

    #[test]
    fn unknown_stored_event_types_survive_a_resave() {
        let Fixture {
            mut session, ada, ..
        } = fixture();
        tag(&mut session, ada, EventType::Goal, 30.0);
        let mut stored = session.to_record().1;
        let mut header = stored[0].clone();
        header.id = Uuid::new_v4();
        header.event_type = "Header".into();
        stored.push(header.clone());

        let match_id = Uuid::new_v4();
        assert_eq!(session.resume(match_id, stored), 1);
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.preserved_events()[0].id, header.id);

        let (_, events) = session.to_record();
        assert_eq!(events.len(), 2);
        let kept = events.iter().find(|e| e.id == header.id).unwrap();
        assert_eq!(kept.event_type, "Header");
        assert_eq!(kept.match_id, Some(match_id));
    }

    #[test]
    fn event_type_labels_parse_back() {
        for kind in EventType::ALL {
            assert_eq!(kind.label().parse::<EventType>().unwrap(), kind);
        }
        assert!("Header".parse::<EventType>().is_err());
    }
}
