use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::layout_engine::SlotMetrics;
use crate::model::occupancy::DEFAULT_TTL;
use crate::model::preferences::Preferences;

pub fn config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("space-indicator").join("config.toml"))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub menu_bar: MenuBarSettings,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuBarSettings {
    pub enabled: bool,
    pub debounce_ms: u64,
    pub occupancy_ttl_ms: u64,
    #[serde(flatten)]
    pub metrics: SlotMetrics,
}

impl Default for MenuBarSettings {
    fn default() -> Self {
        MenuBarSettings {
            enabled: true,
            debounce_ms: 150,
            occupancy_ttl_ms: DEFAULT_TTL.as_millis() as u64,
            metrics: SlotMetrics::default(),
        }
    }
}

impl MenuBarSettings {
    pub fn debounce(&self) -> Duration { Duration::from_millis(self.debounce_ms) }

    pub fn occupancy_ttl(&self) -> Duration { Duration::from_millis(self.occupancy_ttl_ms) }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` if given, else the default location if it exists, else
    /// falls back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(path) => Self::read(path),
            None => match config_file() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    pub fn to_toml(&self) -> anyhow::Result<String> { Ok(toml::to_string_pretty(self)?) }

    fn validate(&self) -> anyhow::Result<()> {
        let scale = self.settings.preferences.toggles.size_scale;
        anyhow::ensure!(
            scale.is_finite() && scale > 0.0,
            "size_scale must be a positive number, got {scale}"
        );
        let metrics = &self.settings.menu_bar.metrics;
        anyhow::ensure!(
            metrics.icon_size.is_finite() && metrics.icon_size > 0.0,
            "icon_size must be a positive number, got {}",
            metrics.icon_size
        );
        anyhow::ensure!(
            metrics.separator_width.is_finite() && metrics.separator_width >= 0.0,
            "separator_width must be a non-negative number, got {}",
            metrics.separator_width
        );
        Ok(())
    }
}
