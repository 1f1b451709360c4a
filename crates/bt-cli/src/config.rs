//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use bt_core::RuleConfig;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Time-window cutoff for a tagging pass, in seconds. Unset consumes
    /// whole recordings.
    pub horizon_secs: Option<f64>,

    /// Speeds below this bound (m/s) count as stopped.
    pub stop_speed_mps: f64,
}

impl Default for Config {
    fn default() -> Self {
        let rules = RuleConfig::default();
        Self {
            horizon_secs: rules.horizon_secs,
            stop_speed_mps: rules.stop_speed_mps,
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

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (BT_*)
        figment = figment.merge(Env::prefixed("BT_"));

        figment.extract()
    }

    /// The rule-engine policy knobs this config carries.
    #[must_use]
    pub const fn rule_config(&self) -> RuleConfig {
        RuleConfig {
            horizon_secs: self.horizon_secs,
            stop_speed_mps: self.stop_speed_mps,
        }
    }
}

/// Returns the platform-specific config directory for bt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bt"))
}
