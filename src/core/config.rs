//! Configuration system: TOML file + env var overrides + smart defaults.
//!
//! The config file doubles as the credential store written by `login`.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TempoError};

/// Application id shared by the config directory and the description tag.
pub const APP_ID: &str = "cleevio-tempo-cli";

/// Full client configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub tempo: TempoConfig,
    pub jira: JiraConfig,
    pub ui: UiConfig,
    pub network: NetworkConfig,
    pub paths: PathsConfig,
}

/// Tempo time-tracking service endpoint and bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TempoConfig {
    pub base_url: String,
    pub token: String,
}

/// Jira issue-tracking endpoint and basic-auth credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JiraConfig {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
}

/// Interactive session timing and presentation knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    /// Seconds between authoritative tracker pulls.
    pub pull_interval_secs: u64,
    /// Milliseconds between display clock refreshes.
    pub clock_interval_ms: u64,
    /// Visible issue suggestions per page.
    pub search_limit: usize,
    /// Set the terminal title to a summary of running trackers.
    pub set_title: bool,
}

/// Collaborator request policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
}

/// Filesystem paths used by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: PathBuf,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tempo.io".to_string(),
            token: String::new(),
        }
    }
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cleevio.atlassian.net".to_string(),
            username: String::new(),
            api_token: String::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            pull_interval_secs: 60,
            clock_interval_ms: 1_000,
            search_limit: 5,
            set_title: true,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[CTC-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join(APP_ID).join("config.toml"),
            activity_log: home_dir
                .join(".local")
                .join("share")
                .join(APP_ID)
                .join("activity.jsonl"),
        }
    }
}

impl UiConfig {
    #[must_use]
    pub const fn pull_interval(&self) -> Duration {
        Duration::from_secs(self.pull_interval_secs)
    }

    #[must_use]
    pub const fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms)
    }
}

impl NetworkConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| TempoError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(TempoError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize_urls();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist the config (including credentials) to `paths.config_file`.
    pub fn save(&self) -> Result<()> {
        let path = &self.paths.config_file;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| TempoError::io(parent, source))?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).map_err(|source| TempoError::io(path, source))?;
        restrict_permissions(path)
    }

    /// Drop stored credentials, keeping every other setting.
    pub fn clear_credentials(&mut self) {
        self.tempo.token.clear();
        self.jira.username.clear();
        self.jira.api_token.clear();
    }

    /// Whether all three credentials needed by the interactive session are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.require_credentials().is_ok()
    }

    /// Fail with a pointer to `login` when any credential is missing.
    pub fn require_credentials(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("tempo token", self.tempo.token.as_str()),
            ("jira username", self.jira.username.as_str()),
            ("jira api token", self.jira.api_token.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TempoError::MissingCredentials {
                details: missing.join(", "),
            })
        }
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CTC_TEMPO_BASE_URL") {
            self.tempo.base_url = raw;
        }
        if let Some(raw) = lookup("CTC_TEMPO_TOKEN") {
            self.tempo.token = raw;
        }
        if let Some(raw) = lookup("CTC_JIRA_BASE_URL") {
            self.jira.base_url = raw;
        }
        if let Some(raw) = lookup("CTC_JIRA_USERNAME") {
            self.jira.username = raw;
        }
        if let Some(raw) = lookup("CTC_JIRA_API_TOKEN") {
            self.jira.api_token = raw;
        }
        if let Some(raw) = lookup("CTC_UI_PULL_INTERVAL_SECS") {
            self.ui.pull_interval_secs = parse_env_u64("CTC_UI_PULL_INTERVAL_SECS", &raw)?;
        }
        if let Some(raw) = lookup("CTC_UI_CLOCK_INTERVAL_MS") {
            self.ui.clock_interval_ms = parse_env_u64("CTC_UI_CLOCK_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("CTC_UI_SEARCH_LIMIT") {
            self.ui.search_limit = parse_env_usize("CTC_UI_SEARCH_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("CTC_UI_SET_TITLE") {
            self.ui.set_title = parse_env_bool("CTC_UI_SET_TITLE", &raw)?;
        }
        if let Some(raw) = lookup("CTC_NETWORK_REQUEST_TIMEOUT_SECS") {
            self.network.request_timeout_secs =
                parse_env_u64("CTC_NETWORK_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("CTC_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }
        Ok(())
    }

    fn normalize_urls(&mut self) {
        let trimmed = self.tempo.base_url.trim_end_matches('/').to_string();
        self.tempo.base_url = trimmed;
        let trimmed = self.jira.base_url.trim_end_matches('/').to_string();
        self.jira.base_url = trimmed;
    }

    /// Validate invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("tempo.base_url", &self.tempo.base_url),
            ("jira.base_url", &self.jira.base_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(TempoError::InvalidConfig {
                    details: format!("{name} must be an http(s) URL, got {url:?}"),
                });
            }
        }

        if self.ui.pull_interval_secs == 0 {
            return Err(TempoError::InvalidConfig {
                details: "ui.pull_interval_secs must be > 0".to_string(),
            });
        }

        if self.ui.clock_interval_ms < 100 {
            return Err(TempoError::InvalidConfig {
                details: format!(
                    "ui.clock_interval_ms must be >= 100, got {}",
                    self.ui.clock_interval_ms
                ),
            });
        }

        if self.ui.search_limit == 0 {
            return Err(TempoError::InvalidConfig {
                details: "ui.search_limit must be > 0".to_string(),
            });
        }

        if self.network.request_timeout_secs == 0 {
            return Err(TempoError::InvalidConfig {
                details: "network.request_timeout_secs must be > 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|source| TempoError::io(path, source))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|error| TempoError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.parse::<usize>().map_err(|error| TempoError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>().map_err(|error| TempoError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
