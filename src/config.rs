use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    #[serde(default = "default_data_dir")]
    pub(crate) data_dir: PathBuf,
    /// Company used when a command does not name one with `--company`.
    #[serde(default = "default_company_id")]
    pub(crate) company_id: String,
    #[serde(default = "default_max_write_attempts")]
    pub(crate) max_write_attempts: u32,
    /// Default log filter; `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub(crate) log_level: String,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "bookkeep", "Bookkeep")
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_company_id() -> String {
    "default".into()
}

fn default_max_write_attempts() -> u32 {
    3
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            company_id: default_company_id(),
            max_write_attempts: default_max_write_attempts(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Settings from the platform config directory, or defaults when none are saved.
    pub(crate) fn load() -> Result<Self> {
        match settings_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub(crate) fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    pub(crate) fn save(&self) -> Result<PathBuf> {
        let path = settings_path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub(crate) fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }

    /// The SQLite file, creating its directory when missing.
    pub(crate) fn database_path(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data directory: {}", self.data_dir.display()))?;
        Ok(self.data_dir.join("bookkeep.db"))
    }
}

fn settings_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join(SETTINGS_FILE))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
