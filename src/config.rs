use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;

use crate::theme::ThemeConfig;

/// Which event store the browser talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// EventKit on macOS, the in-memory demo store elsewhere.
    #[default]
    Auto,
    EventKit,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// How far back the "completed" filter looks, in days.
    pub completed_days: u32,
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            log_level: "info".to_string(),
            log_file: None,
            completed_days: 7,
            theme: ThemeConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.config/remindkit/config.toml`; a missing file means defaults.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).map_err(|e| eyre!("invalid config {}: {e}", path.display()))
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| {
            dirs::cache_dir().map(|d| d.join("remindkit").join("remindkit.log"))
        })
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("remindkit").join("config.toml"))
}
