use std::path::{Path, PathBuf};

use color_eyre::{Result, eyre::Context};
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::reconcile::MatchConfig;

pub const DEFAULT_SPREADSHEET_NAME: &str = "Music Saved Tracks";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    spotify: SpotifySection,
    #[serde(default)]
    google: GoogleSection,
    #[serde(default)]
    mirror: MirrorSection,
    #[serde(default)]
    pub matching: MatchConfig,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct SpotifySection {
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    token_cache: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct GoogleSection {
    access_token: Option<String>,
    spreadsheet: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct MirrorSection {
    path: Option<String>,
}

/// Everything needed to talk to the Spotify Web API on behalf of the user.
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_cache: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub access_token: String,
    pub spreadsheet: String,
}

const DEFAULT_CONFIG: &str = r#"# music-ledger configuration

[spotify]
# client_id = ""        # or SPOTIFY_CLIENT_ID
# client_secret = ""    # or SPOTIFY_CLIENT_SECRET
# refresh_token = ""    # or SPOTIFY_REFRESH_TOKEN
# token_cache = "~/.cache/music-ledger/spotify-token.json"

[google]
# access_token = ""     # or GOOGLE_SHEETS_ACCESS_TOKEN
spreadsheet = "Music Saved Tracks"

[mirror]
path = "song-list.xlsx"

[matching]
audio_extensions = ["mp3", "flac", "m4a", "ogg", "wav"]
folder_threshold = 80.0
match_threshold = 85.0
title_weight = 0.7
artist_weight = 0.3
missing_artist_score = 50.0
infer_artist_from_folder = false
"#;

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("music-ledger").join("config.toml"))
    }

    /// Load the default config file, or fall back to defaults plus environment
    /// variables when none exists.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults and environment");
                Ok(Self::default())
            }
        }
    }

    /// Create a default config file, if it doesn't exist
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path()
            .ok_or_else(|| color_eyre::eyre::eyre!("No config directory for this platform"))?;
        if path.exists() {
            tracing::info!("Config already exists at {}", path.display());
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, DEFAULT_CONFIG)
            .context(format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    pub fn spotify_credentials(&self) -> Result<SpotifyCredentials, ReconcileError> {
        let section = &self.spotify;
        let client_id = setting(section.client_id.as_deref(), "SPOTIFY_CLIENT_ID")
            .ok_or_else(|| ReconcileError::configuration("spotify.client_id is not provided"))?;
        let client_secret = setting(section.client_secret.as_deref(), "SPOTIFY_CLIENT_SECRET")
            .ok_or_else(|| {
                ReconcileError::configuration("spotify.client_secret is not provided")
            })?;
        let refresh_token = setting(section.refresh_token.as_deref(), "SPOTIFY_REFRESH_TOKEN")
            .ok_or_else(|| {
                ReconcileError::configuration("spotify.refresh_token is not provided")
            })?;

        let token_cache = match &section.token_cache {
            Some(path) => self.expand_path(path),
            None => dirs::cache_dir()
                .map(|dir| dir.join("music-ledger").join("spotify-token.json"))
                .unwrap_or_else(|| PathBuf::from(".cache")),
        };

        Ok(SpotifyCredentials {
            client_id,
            client_secret,
            refresh_token,
            token_cache,
        })
    }

    pub fn google_credentials(&self) -> Result<GoogleCredentials, ReconcileError> {
        let access_token = setting(
            self.google.access_token.as_deref(),
            "GOOGLE_SHEETS_ACCESS_TOKEN",
        )
        .ok_or_else(|| ReconcileError::configuration("google.access_token is not provided"))?;

        Ok(GoogleCredentials {
            access_token,
            spreadsheet: self
                .google
                .spreadsheet
                .clone()
                .unwrap_or_else(|| DEFAULT_SPREADSHEET_NAME.to_string()),
        })
    }

    pub fn mirror_path(&self) -> PathBuf {
        self.expand_path(self.mirror.path.as_deref().unwrap_or("song-list.xlsx"))
    }
}

/// A config value, falling back to the environment when unset or blank.
fn setting(value: Option<&str>, env_key: &str) -> Option<String> {
    let non_blank = |v: &String| !v.trim().is_empty();
    value
        .map(str::to_string)
        .filter(non_blank)
        .or_else(|| std::env::var(env_key).ok().filter(non_blank))
}
