//! Static bot configuration.
//!
//! Loaded once at startup from a TOML file, with a handful of secrets
//! overridable from the environment (or a `.env` file). The coordinator and
//! its subsystems only ever read it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::gateway::{Activity, OnlineStatus};
use crate::{Error, Result};

/// Environment variable overriding `token`.
pub const ENV_TOKEN: &str = "TUNEBOT_TOKEN";
/// Environment variable overriding `spotify_client_id`.
pub const ENV_SPOTIFY_CLIENT_ID: &str = "TUNEBOT_SPOTIFY_CLIENT_ID";
/// Environment variable overriding `spotify_client_secret`.
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "TUNEBOT_SPOTIFY_CLIENT_SECRET";

const DEFAULT_PREFIX: &str = "@mention";
const DEFAULT_GAME: &str = "DEFAULT";
const DEFAULT_PLAYLISTS_FOLDER: &str = "Playlists";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 5;

/// Bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Platform bot token.
    pub token: String,
    /// Account id of the bot owner (operator commands).
    pub owner_id: u64,
    /// Command prefix.
    pub prefix: String,
    /// Display name of the bot.
    pub bot_name: String,
    /// Activity text, e.g. `"listening to jazz"`. `"none"` hides the activity,
    /// `"DEFAULT"` shows "Playing <prefix>help".
    pub game: String,
    pub status: OnlineStatus,
    /// Mirror the current track into the bot's presence.
    pub song_in_status: bool,
    pub stay_in_channel: bool,
    /// Maximum track length accepted into a queue, 0 for unlimited.
    pub max_track_seconds: u64,
    /// Seconds a voice channel may stay empty before playback stops, 0 disables.
    pub alone_time_until_stop: u64,
    pub playlists_folder: PathBuf,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub log_dir: PathBuf,
    /// Period of the now-playing refresh, 0 disables it.
    pub update_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner_id: 0,
            prefix: DEFAULT_PREFIX.to_string(),
            bot_name: "tunebot".to_string(),
            game: DEFAULT_GAME.to_string(),
            status: OnlineStatus::Online,
            song_in_status: false,
            stay_in_channel: false,
            max_track_seconds: 0,
            alone_time_until_stop: 0,
            playlists_folder: PathBuf::from(DEFAULT_PLAYLISTS_FOLDER),
            spotify_client_id: String::new(),
            spotify_client_secret: String::new(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
        }
    }
}

impl BotConfig {
    /// Load the configuration from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "Loading configuration");

        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io_path("reading config file", path, e))?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration from TOML text without touching the environment.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::config(format!("Invalid config file: {}", e)))
    }

    /// Replace secrets with values from the environment when present.
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            (ENV_TOKEN, &mut self.token),
            (ENV_SPOTIFY_CLIENT_ID, &mut self.spotify_client_id),
            (ENV_SPOTIFY_CLIENT_SECRET, &mut self.spotify_client_secret),
        ];

        for (var, field) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    debug!(var, "Applying environment override");
                    *field = value;
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::config("Bot token must not be empty"));
        }
        if self.prefix.is_empty() {
            return Err(Error::config("Command prefix must not be empty"));
        }
        Ok(())
    }

    /// Desired activity derived from `game`.
    pub fn activity(&self) -> Option<Activity> {
        if self.game.eq_ignore_ascii_case(DEFAULT_GAME) {
            return Some(Activity::playing(format!("{}help", self.prefix)));
        }
        Activity::parse(&self.game)
    }

    /// Whether both halves of the streaming-provider credential pair are set.
    pub fn has_spotify_credentials(&self) -> bool {
        !self.spotify_client_id.is_empty() && !self.spotify_client_secret.is_empty()
    }

    /// Whether `command` (the message text) is the owner's shutdown command.
    pub fn is_shutdown_command(&self, author_id: u64, content: &str) -> bool {
        author_id == self.owner_id
            && self.owner_id != 0
            && content.trim() == format!("{}shutdown", self.prefix)
    }
}
