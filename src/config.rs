//! Application-level configuration loading: party defaults and storage backend selection.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "WRAPPED_PARTY_CONFIG_PATH";
/// Environment variable selecting the storage backend.
const STORE_ENV: &str = "PARTY_STORE";

const DEFAULT_SONGS_PER_ROUND: u32 = 5;
const DEFAULT_PARTY_ID_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    songs_per_round: u32,
    party_id_attempts: u32,
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
                        songs_per_round = app_config.songs_per_round,
                        party_id_attempts = app_config.party_id_attempts,
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

    /// Round size applied to parties created without an explicit one.
    pub fn songs_per_round(&self) -> u32 {
        self.songs_per_round
    }

    /// How many fresh identifiers party creation tries before giving up on collisions.
    pub fn party_id_attempts(&self) -> u32 {
        self.party_id_attempts
    }

    /// Override the default round size.
    pub fn with_songs_per_round(mut self, songs_per_round: u32) -> Self {
        self.songs_per_round = songs_per_round.max(1);
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            songs_per_round: DEFAULT_SONGS_PER_ROUND,
            party_id_attempts: DEFAULT_PARTY_ID_ATTEMPTS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    songs_per_round: Option<u32>,
    party_id_attempts: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            songs_per_round: positive_or_default(
                "songs_per_round",
                value.songs_per_round,
                DEFAULT_SONGS_PER_ROUND,
            ),
            party_id_attempts: positive_or_default(
                "party_id_attempts",
                value.party_id_attempts,
                DEFAULT_PARTY_ID_ATTEMPTS,
            ),
        }
    }
}

fn positive_or_default(key: &'static str, value: Option<u32>, default: u32) -> u32 {
    match value {
        Some(0) => {
            warn!(key, default, "config value must be positive; using default");
            default
        }
        Some(value) => value,
        None => default,
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Storage backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local store; data is lost on restart.
    Memory,
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
}

impl StorageBackend {
    /// Read the backend from `PARTY_STORE`, defaulting to the first durable backend compiled in.
    pub fn from_env() -> Self {
        match env::var(STORE_ENV) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                let fallback = Self::default();
                warn!(value = %value, ?fallback, "unknown storage backend; using default");
                fallback
            }),
            Err(_) => Self::default(),
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(StorageBackend::Memory),
            #[cfg(feature = "mongo-store")]
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            #[cfg(feature = "couch-store")]
            "couch" | "couchdb" => Some(StorageBackend::Couch),
            _ => None,
        }
    }
}

impl Default for StorageBackend {
    fn default() -> Self {
        #[cfg(feature = "mongo-store")]
        {
            StorageBackend::Mongo
        }
        #[cfg(all(not(feature = "mongo-store"), feature = "couch-store"))]
        {
            StorageBackend::Couch
        }
        #[cfg(all(not(feature = "mongo-store"), not(feature = "couch-store")))]
        {
            StorageBackend::Memory
        }
    }
}
