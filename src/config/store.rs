// ABOUTME: Loads and saves user_settings.json under the per-user config directory
// Missing or unreadable files fall back to defaults so the calculator always starts

use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

use super::settings::{ApiSettings, SettingsDocument, SettingsError};

pub const SETTINGS_FILE_NAME: &str = "user_settings.json";

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/netcalc/user_settings.json`, when a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "netcalc").map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ApiSettings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No settings at {:?} ({}), using defaults", self.path, e);
                return ApiSettings::default();
            }
        };

        if content.trim().is_empty() {
            return ApiSettings::default();
        }

        match serde_json::from_str::<SettingsDocument>(&content) {
            Ok(doc) => ApiSettings::from_document(&doc),
            Err(e) => {
                warn!("Failed to parse settings file {:?}: {}", self.path, e);
                ApiSettings::default()
            }
        }
    }

    /// Validate and persist. Returns the resolved base URL.
    pub fn save(&self, settings: &ApiSettings) -> Result<Url, SettingsError> {
        let doc = settings.to_document()?;
        let base = settings.base_url()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let json = serde_json::to_string_pretty(&doc)?;
        fs::write(&self.path, json).map_err(|source| self.io_error(source))?;

        info!("Saved settings to {:?} (base {})", self.path, base);
        Ok(base)
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
