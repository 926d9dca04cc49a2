//! Application-level configuration loading: listening port, origin allow-list,
//! storage backend selection and round timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PATTERN_ARENA_CONFIG_PATH";
/// Environment variable that overrides the configured storage backend.
const STORE_ENV: &str = "ARENA_STORE";
const DEFAULT_PORT: u16 = 8080;
/// Origin entry that admits every caller.
pub const ANY_ORIGIN: &str = "*";

/// Persistence backend used for arena records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on restart.
    #[default]
    Memory,
    /// MongoDB collection (requires the `mongo-store` feature).
    Mongo,
    /// CouchDB database (requires the `couch-store` feature).
    Couch,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "mongo" | "mongodb" => Some(Self::Mongo),
            "couch" | "couchdb" => Some(Self::Couch),
            _ => None,
        }
    }
}

/// Delays driving the round sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTimings {
    /// Countdown shown before a pattern is revealed.
    pub countdown: Duration,
    /// How long the pattern stays visible.
    pub reveal: Duration,
    /// How long a round result is shown before moving on.
    pub result: Duration,
    /// Optional limit on the answer phase; `None` waits indefinitely.
    pub answer_timeout: Option<Duration>,
}

impl Default for RoundTimings {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(3),
            reveal: Duration::from_secs(2),
            result: Duration::from_secs(3),
            answer_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// TCP port the server listens on.
    pub port: u16,
    /// Origins allowed to open a WebSocket; `*` admits all.
    pub allowed_origins: Vec<String>,
    /// Backend used for arena records.
    pub storage: StorageBackend,
    /// Round sequencing delays.
    pub timings: RoundTimings,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        storage = ?app_config.storage,
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
        };

        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(port) = env::var("PORT")
            .or_else(|_| env::var("SERVER_PORT"))
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
        {
            self.port = port;
        }

        if let Ok(value) = env::var(STORE_ENV) {
            match StorageBackend::parse(&value) {
                Some(storage) => self.storage = storage,
                None => warn!(value = %value, "unknown {STORE_ENV} value; keeping configured backend"),
            }
        }

        self
    }

    /// Whether every origin is admitted.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == ANY_ORIGIN)
    }

    /// Whether a WebSocket handshake carrying `origin` may proceed.
    ///
    /// Requests without an `Origin` header (non-browser clients) are always admitted.
    pub fn is_origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(_) if self.allows_any_origin() => true,
            Some(origin) => self
                .allowed_origins
                .iter()
                .any(|allowed| allowed.trim_end_matches('/') == origin.trim_end_matches('/')),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origins: vec![ANY_ORIGIN.to_string()],
            storage: StorageBackend::default(),
            timings: RoundTimings::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    port: Option<u16>,
    allowed_origins: Option<Vec<String>>,
    storage: Option<StorageBackend>,
    timings: RawTimings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the `timings` block, all values in milliseconds.
struct RawTimings {
    countdown_ms: Option<u64>,
    reveal_ms: Option<u64>,
    result_ms: Option<u64>,
    answer_timeout_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            port: value.port.unwrap_or(defaults.port),
            allowed_origins: value
                .allowed_origins
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),
            storage: value.storage.unwrap_or(defaults.storage),
            timings: value.timings.into(),
        }
    }
}

impl From<RawTimings> for RoundTimings {
    fn from(value: RawTimings) -> Self {
        let defaults = Self::default();
        Self {
            countdown: value
                .countdown_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.countdown),
            reveal: value
                .reveal_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.reveal),
            result: value
                .result_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.result),
            answer_timeout: value
                .answer_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
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
