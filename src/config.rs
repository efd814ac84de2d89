//! Optional TOML configuration at `~/.config/vidboard/config.toml`.
//!
//! A missing or blank file means defaults. Unknown keys are accepted and
//! logged so typos show up in the log instead of failing startup.
use crate::api::ApiSettings;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level configuration. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend root URL.
    pub server_url: String,

    /// Timeout for ordinary requests, in seconds.
    pub request_timeout_secs: u64,

    /// Timeout for `/api/refresh`, which waits on upstream collection.
    pub refresh_timeout_secs: u64,

    /// Add a `t=<millis>` query parameter to feed fetches.
    pub cache_bust: bool,

    /// Reload the feed every N minutes while the dashboard is open. 0 = off.
    pub refresh_interval_minutes: u64,

    /// "dark" or "light".
    pub theme: String,

    /// Action name → key string overrides, e.g. `refresh = "F5"`.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            server_url: api.base_url,
            request_timeout_secs: api.request_timeout.as_secs(),
            refresh_timeout_secs: api.refresh_timeout.as_secs(),
            cache_bust: api.cache_bust,
            refresh_interval_minutes: 0,
            theme: "dark".to_string(),
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "server_url",
        "request_timeout_secs",
        "refresh_timeout_secs",
        "cache_bust",
        "refresh_interval_minutes",
        "theme",
        "keybindings",
    ];

    /// Load configuration from `path`.
    ///
    /// - Missing, empty, or whitespace-only file → defaults
    /// - Larger than 1 MB → `ConfigError::TooLarge`
    /// - Invalid TOML or wrong value types → `ConfigError::Parse`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge {
                    size: meta.len(),
                    max: Self::MAX_FILE_SIZE,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse configuration text. Blank input yields defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            server_url = %config.server_url,
            theme = %config.theme,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Client settings derived from this configuration.
    ///
    /// A zero timeout would fail every request, so it is raised to one second.
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.server_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            refresh_timeout: Duration::from_secs(self.refresh_timeout_secs.max(1)),
            cache_bust: self.cache_bust,
        }
    }

    /// Periodic reload interval, if enabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_minutes > 0)
            .then(|| Duration::from_secs(self.refresh_interval_minutes.saturating_mul(60)))
    }
}

// ============================================================================
// Tests
// ============================================================================
