//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the action log.
    pub log_path: PathBuf,

    /// Schedule compared against by `wl stats`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_path: Option<PathBuf>,

    /// Month goals as duration text, e.g. `"160h"`.
    #[serde(default)]
    pub goals: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_days: Option<Vec<u32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_days_next: Option<Vec<u32>>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            log_path: data_dir.join("log.json"),
            schedule_path: None,
            goals: Vec::new(),
            remaining_days: None,
            remaining_days_next: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // WL_LOG_PATH, WL_GOALS='["160h"]', ...
        figment = figment.merge(Env::prefixed("WL_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for wl.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("worklog"))
}

/// Returns the platform-specific data directory for wl.
///
/// On Linux: `~/.local/share/worklog`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("worklog"))
}
