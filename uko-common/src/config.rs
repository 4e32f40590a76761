//! Configuration loading and API base URL resolution
//!
//! The scoring service base URL is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`UKO_API_URL`)
//! 3. TOML config file (`api_url`)
//! 4. Build-mode default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the scoring service base URL
pub const API_URL_ENV: &str = "UKO_API_URL";

/// Deployed scoring service, used by release builds
pub const PRODUCTION_API_URL: &str = "https://uko-single-predictor.onrender.com/api";

/// Relative API path served by the local dev proxy, used by debug builds
pub const DEVELOPMENT_API_PATH: &str = "/api";

/// Origin that relative base URLs are resolved against
pub const DEV_SERVER_ORIGIN: &str = "http://localhost:5173";

/// Client-side deadline for a single request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Wall-clock length of the percentage reveal
pub const REVEAL_DURATION: Duration = Duration::from_millis(2000);

/// Sampling cadence of the reveal (~60 Hz display refresh)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// How long the "copied" flag stays set after a clipboard write
pub const COPIED_WINDOW: Duration = Duration::from_millis(2000);

/// Which default base URL applies when nothing overrides it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// Debug builds are development, release builds are production
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Development
        } else {
            BuildMode::Production
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            BuildMode::Development => DEVELOPMENT_API_PATH,
            BuildMode::Production => PRODUCTION_API_URL,
        }
    }
}

/// Optional settings file (`~/.config/uko/config.toml` by default)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Scoring service base URL, e.g. `https://host/api`
    #[serde(default)]
    pub api_url: Option<String>,

    /// Request deadline in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Command used as the native share target; receives the text on stdin
    #[serde(default)]
    pub share_command: Option<Vec<String>>,

    /// Link attached to shared results
    #[serde(default)]
    pub share_url: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("uko").join("config.toml"))
}

/// Load the TOML config
///
/// An explicitly requested file must exist. The default location is
/// optional: a missing file yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            Some(path) => {
                debug!("Config file not found at {}, using defaults", path.display());
                return Ok(TomlConfig::default());
            }
            None => {
                debug!("Could not determine config directory, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    debug!(path = %path.display(), "Loaded TOML config");
    Ok(config)
}

/// Resolve the scoring service base URL
///
/// Blank values at any tier are skipped. Relative results (`/api`) are
/// joined onto [`DEV_SERVER_ORIGIN`]; trailing slashes are dropped.
pub fn resolve_api_base(cli_arg: Option<&str>, toml_config: &TomlConfig, mode: BuildMode) -> String {
    let env_value = std::env::var(API_URL_ENV).ok();

    let (source, base) = if let Some(url) = cli_arg.filter(|u| is_usable(u)) {
        ("command line", url.to_string())
    } else if let Some(url) = env_value.filter(|u| is_usable(u)) {
        ("environment", url)
    } else if let Some(url) = toml_config.api_url.as_deref().filter(|u| is_usable(u)) {
        ("TOML config", url.to_string())
    } else {
        ("build default", mode.default_api_base().to_string())
    };

    let base = absolutize(base.trim());
    info!(source, api_base = %base, "Resolved scoring service base URL");
    base
}

fn is_usable(value: &str) -> bool {
    !value.trim().is_empty()
}

fn absolutize(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.starts_with('/') {
        format!("{}{}", DEV_SERVER_ORIGIN, base)
    } else {
        base.to_string()
    }
}

/// Resolved runtime configuration for the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Absolute base URL, no trailing slash
    pub api_base: String,
    pub request_timeout: Duration,
    pub reveal_duration: Duration,
    pub frame_interval: Duration,
    pub copied_window: Duration,
    pub share_command: Option<Vec<String>>,
    pub share_url: Option<String>,
}

impl ClientConfig {
    /// Built-in defaults against a given base URL
    pub fn with_api_base(api_base: impl AsRef<str>) -> Self {
        Self {
            api_base: absolutize(api_base.as_ref().trim()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reveal_duration: REVEAL_DURATION,
            frame_interval: FRAME_INTERVAL,
            copied_window: COPIED_WINDOW,
            share_command: None,
            share_url: None,
        }
    }

    /// Combine command line, environment, TOML and build defaults
    pub fn resolve(cli_api_url: Option<&str>, toml_config: &TomlConfig, mode: BuildMode) -> Self {
        let mut config = Self::with_api_base(resolve_api_base(cli_api_url, toml_config, mode));

        if let Some(secs) = toml_config.request_timeout_secs {
            if secs == 0 {
                warn!("request_timeout_secs = 0 ignored, keeping default");
            } else {
                config.request_timeout = Duration::from_secs(secs);
            }
        }
        config.share_command = toml_config
            .share_command
            .clone()
            .filter(|argv| !argv.is_empty());
        config.share_url = toml_config.share_url.clone();
        config
    }

    /// Full URL for an endpoint path such as `predict`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}
