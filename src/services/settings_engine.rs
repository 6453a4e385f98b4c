// charrank Settings Engine
// Manages ranking settings: loading, saving, updating individual values, and resetting to defaults.
// Settings are stored as a JSON file in the platform config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::types::errors::SettingsError;
use crate::types::settings::{AutosaveSettings, RankingSettings};

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<RankingSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &RankingSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: RankingSettings,
}

/// Returns `<config dir>/charrank/settings.json`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("charrank")
        .join("settings.json")
}

/// Checks cross-field constraints that serde cannot express.
pub fn validate(settings: &RankingSettings) -> Result<(), SettingsError> {
    let minutes = settings.autosave.interval_minutes;
    if !(AutosaveSettings::MIN_INTERVAL_MINUTES..=AutosaveSettings::MAX_INTERVAL_MINUTES)
        .contains(&minutes)
    {
        return Err(SettingsError::InvalidValue(format!(
            "autosave.interval_minutes must be between {} and {}, got {}",
            AutosaveSettings::MIN_INTERVAL_MINUTES,
            AutosaveSettings::MAX_INTERVAL_MINUTES,
            minutes
        )));
    }
    if settings.history.capacity == 0 {
        return Err(SettingsError::InvalidValue(
            "history.capacity must be at least 1".to_string(),
        ));
    }
    if settings.api.timeout_secs == 0 {
        return Err(SettingsError::InvalidValue(
            "api.timeout_secs must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Replaces the existing leaf at dotted `key` inside `tree`.
///
/// Only keys already present can be set, so a typo never adds a field.
fn assign_path(tree: &mut Value, key: &str, value: Value) -> Result<(), SettingsError> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(SettingsError::InvalidKey(format!("Invalid key '{}'", key)));
    }

    let mut node = tree;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        node = node
            .get_mut(part)
            .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))?;
    }

    match node {
        Value::Object(map) if map.contains_key(leaf) => {
            map.insert(leaf.to_string(), value);
            Ok(())
        }
        Value::Object(_) => Err(SettingsError::InvalidKey(format!(
            "Key '{}' not found in settings",
            key
        ))),
        _ => Err(SettingsError::InvalidKey(format!(
            "Cannot navigate to key '{}': intermediate value is not an object",
            key
        ))),
    }
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses [`default_config_path`].
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => default_config_path().to_string_lossy().to_string(),
        };

        Self {
            config_path,
            settings: RankingSettings::default(),
        }
    }

    /// Replaces the in-memory settings after validation, then saves.
    pub fn replace(&mut self, settings: RankingSettings) -> Result<(), SettingsError> {
        validate(&settings)?;
        self.settings = settings;
        self.save()
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed or out of range, returns an error.
    fn load(&mut self) -> Result<RankingSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            debug!(path = %self.config_path, "No settings file, using defaults");
            self.settings = RankingSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: RankingSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &RankingSettings {
        &self.settings
    }

    /// Updates one setting by dotted key, e.g. `autosave.interval_minutes`
    /// or `api.base_url`. The result must still validate; it is saved at once.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        let mut tree = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;
        assign_path(&mut tree, key, value)?;

        let new_settings: RankingSettings = serde_json::from_value(tree).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        validate(&new_settings)?;

        self.settings = new_settings;
        self.save()?;
        info!(key, "Setting updated");

        Ok(())
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = RankingSettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
