use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tunewatch_media_session::ConnectorConfig;

/// Application configuration, read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub connector: ConnectorConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How often the printed state is re-read from the connector
    pub refresh_ms: u64,
    /// Print JSON lines instead of text
    pub json: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 1000,
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from `explicit`, or from the default location when present.
    ///
    /// A missing default file means defaults; an explicit file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// `<config dir>/tunewatch/config.toml` (platform-specific)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tunewatch").join("config.toml"))
}
