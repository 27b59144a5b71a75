use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a match store connection.
    pub degraded: bool,
    /// Whether a tracking session is open.
    pub tracking: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after the tracking session was written to the match store.
pub struct MatchSavedEvent {
    pub match_id: Uuid,
    pub youtube_id: String,
    pub event_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a save failed; local state is left untouched.
pub struct MatchSaveFailedEvent {
    pub youtube_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the client reports that playback was paused.
pub struct PlaybackPausedEvent {
    /// Position in seconds.
    pub current_time: f64,
    /// Position rendered as `M:SS`.
    pub time_string: String,
}
