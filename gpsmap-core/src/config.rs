use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::color::{ColorTable, MarkerColor};

pub const DEFAULT_ENDPOINT: &str = "https://backendforpnf.vercel.app/getgps";
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_ZOOM: u8 = 7;
pub const MAX_ZOOM: u8 = 19;

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Location API returning `{ "data": [...] }`.
    pub endpoint: Option<String>,

    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: Option<String>,

    pub zoom: Option<u8>,

    /// Extra or replacement marker colors, e.g.
    /// [colors]
    /// "jane doe" = "green"
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Config {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn tile_url(&self) -> &str {
        self.tile_url.as_deref().unwrap_or(DEFAULT_TILE_URL)
    }

    pub fn zoom(&self) -> u8 {
        self.zoom.unwrap_or(DEFAULT_ZOOM).min(MAX_ZOOM)
    }

    /// Built-in color table with the configured overrides applied.
    pub fn color_table(&self) -> Result<ColorTable> {
        let mut table = ColorTable::default();
        for (user, color) in &self.colors {
            let color = MarkerColor::try_from(color.as_str())
                .with_context(|| format!("Invalid color for user '{user}' in config"))?;
            table.assign(user, color);
        }
        Ok(table)
    }

    pub fn set_user_color(&mut self, username: &str, color: MarkerColor) {
        self.colors.insert(username.to_lowercase(), color.to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "gpsmap", "gpsmap")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
