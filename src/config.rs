//! Application-level configuration loading: save debounce, playback cadence,
//! setup gate and draft location.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCH_TRACKER_CONFIG_PATH";

const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(1_000);
const DEFAULT_PLAYBACK_POLL: Duration = Duration::from_millis(100);
const DEFAULT_MIN_PLAYERS: usize = 2;
const DEFAULT_DRAFT_PATH: &str = "data/match_setup.json";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Quiescence delay before a tracking change is pushed to the match store.
    pub save_debounce: Duration,
    /// Sampling interval of the playback poller.
    pub playback_poll: Duration,
    /// Minimum roster size required to start tracking.
    pub min_players: usize,
    /// File holding the setup draft.
    pub draft_path: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        debounce_ms = app_config.save_debounce.as_millis() as u64,
                        min_players = app_config.min_players,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_debounce: DEFAULT_SAVE_DEBOUNCE,
            playback_poll: DEFAULT_PLAYBACK_POLL,
            min_players: DEFAULT_MIN_PLAYERS,
            draft_path: PathBuf::from(DEFAULT_DRAFT_PATH),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    save_debounce_ms: Option<u64>,
    playback_poll_ms: Option<u64>,
    min_players: Option<usize>,
    draft_path: Option<PathBuf>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            save_debounce: value
                .save_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.save_debounce),
            // A zero period would make `tokio::time::interval` panic.
            playback_poll: value
                .playback_poll_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.playback_poll),
            min_players: value.min_players.unwrap_or(defaults.min_players),
            draft_path: value
                .draft_path
                .filter(|path| !path.as_os_str().is_empty())
                .unwrap_or(defaults.draft_path),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{ "save_debounce_ms": 250 }"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.save_debounce, Duration::from_millis(250));
        assert_eq!(config.playback_poll, DEFAULT_PLAYBACK_POLL);
        assert_eq!(config.min_players, 2);
        assert_eq!(config.draft_path, PathBuf::from(DEFAULT_DRAFT_PATH));
    }

    #[test]
    fn zero_poll_interval_is_ignored() {
        let raw: RawConfig = serde_json::from_str(r#"{ "playback_poll_ms": 0 }"#).unwrap();
        assert_eq!(AppConfig::from(raw).playback_poll, DEFAULT_PLAYBACK_POLL);
    }
}
