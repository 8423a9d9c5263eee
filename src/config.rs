// ⚙️ Configuration - where the ICE DB and saved calculations live
// Optional TOML file, command-line flags win over it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "carbon-calc.toml";
pub const DEFAULT_ICE_DB_PATH: &str = "Carbon Calc.csv";
pub const DEFAULT_SAVE_FOLDER: &str = "saved_calculations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ice_db_path: PathBuf,
    pub save_folder: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            ice_db_path: PathBuf::from(DEFAULT_ICE_DB_PATH),
            save_folder: PathBuf::from(DEFAULT_SAVE_FOLDER),
        }
    }
}

impl AppConfig {
    /// Read `path`, or fall back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        ice_db_path: Option<PathBuf>,
        save_folder: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = ice_db_path {
            self.ice_db_path = path;
        }
        if let Some(folder) = save_folder {
            self.save_folder = folder;
        }
        self
    }

    /// Log file used while the terminal UI owns the screen.
    pub fn log_path(&self) -> PathBuf {
        self.save_folder.join("carbon-calc.log")
    }
}
