use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::timer::{DEFAULT_SESSION_SECS, TimerMode};

pub const MIN_SESSION_SECS: u32 = 60;
pub const MAX_SESSION_SECS: u32 = 7200;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub timer_mode: TimerMode,
    #[serde(default = "default_session_length_secs")]
    pub session_length_secs: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_session_length_secs() -> u32 {
    DEFAULT_SESSION_SECS
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readingroom")
        .to_string_lossy()
        .to_string()
}

/// Settings given for a single run, e.g. on the command line. They shape the
/// running config but are never written back.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub theme: Option<String>,
    pub timer_mode: Option<TimerMode>,
    pub session_length_secs: Option<u32>,
    pub data_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            timer_mode: TimerMode::default(),
            session_length_secs: default_session_length_secs(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Copy of this config with the run-only overrides applied.
    pub fn with_overrides(&self, overrides: &Overrides) -> Config {
        let mut config = self.clone();
        if let Some(theme) = &overrides.theme {
            config.theme = theme.clone();
        }
        if let Some(mode) = overrides.timer_mode {
            config.timer_mode = mode;
        }
        if let Some(secs) = overrides.session_length_secs {
            config.session_length_secs = secs;
        }
        if let Some(dir) = &overrides.data_dir {
            config.data_dir = dir.clone();
        }
        config
    }

    /// What to save at exit: `stored` plus the settings changed in the app
    /// since `launched`. Only the timer mode can change while running.
    pub fn persisted(&self, stored: &Config, launched: &Config) -> Config {
        let mut config = stored.clone();
        if self.timer_mode != launched.timer_mode {
            config.timer_mode = self.timer_mode;
        }
        config
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("readingroom")
            .join("config.toml")
    }

    /// Directory for completion records and the log file.
    pub fn data_dir(&self) -> PathBuf {
        if self.data_dir.trim().is_empty() {
            PathBuf::from(default_data_dir())
        } else {
            PathBuf::from(&self.data_dir)
        }
    }

    /// Clamp out-of-range values and reset a theme that is not installed.
    /// Call after deserialization and after applying CLI overrides.
    pub fn validate(&mut self, valid_themes: &[String]) {
        self.session_length_secs = self
            .session_length_secs
            .clamp(MIN_SESSION_SECS, MAX_SESSION_SECS);
        if !valid_themes.iter().any(|t| *t == self.theme) {
            tracing::warn!("unknown theme {:?}, using {}", self.theme, default_theme());
            self.theme = default_theme();
        }
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}
