//! Read-only configuration surface for the core: which model to use, the
//! language hint, and the translate flag. Stored as TOML in the app
//! directory; the application layer owns writes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, VoxkeyError};
use crate::models::Model;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Id of the active model (see [`Model::id`]).
    pub active: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// ISO language hint; empty means auto-detect.
    #[serde(default)]
    pub language: String,
    /// Translate output to English.
    #[serde(default)]
    pub translate: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let recommended = Model::ALL
            .iter()
            .copied()
            .find(|m| m.recommended())
            .unwrap_or(Model::BaseEn);
        Self {
            active: recommended.id().to_string(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: String::new(),
            translate: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            transcription: TranscriptionConfig::default(),
        }
    }
}

impl Config {
    /// Path to the voxkey directory (~/.voxkey)
    pub fn app_dir() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".voxkey")
    }

    pub fn config_path() -> PathBuf {
        Self::app_dir().join("config.toml")
    }

    /// Where model artifacts live.
    pub fn models_dir() -> PathBuf {
        Self::app_dir().join("models")
    }

    /// Pre-0.1 releases kept models directly in the app dir.
    pub fn legacy_models_dir() -> PathBuf {
        Self::app_dir()
    }

    pub fn exists() -> bool {
        Self::config_path().exists()
    }

    /// Load config from file.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let content = fs::read_to_string(&path)
            .map_err(|e| VoxkeyError::Config(format!("failed to read config file: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| VoxkeyError::Config(format!("failed to parse config file: {e}")))?;
        Ok(config)
    }

    /// Load the config, falling back to defaults when no file exists.
    pub fn load_or_default() -> Self {
        if Self::exists() {
            Self::load().unwrap_or_else(|e| {
                tracing::warn!("{e}; using defaults");
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save config to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| VoxkeyError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// The configured model, rejecting unknown ids.
    pub fn active_model(&self) -> Result<Model> {
        Model::from_id(&self.model.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_names_the_recommended_model() {
        let config = Config::default();
        let model = config.active_model().unwrap();
        assert!(model.recommended());
        assert!(config.transcription.language.is_empty());
        assert!(!config.transcription.translate);
    }

    #[test]
    fn roundtrips_through_toml() {
        let mut config = Config::default();
        config.model.active = "tiny".to_string();
        config.transcription.language = "de".to_string();
        config.transcription.translate = true;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.model.active, "tiny");
        assert_eq!(parsed.transcription.language, "de");
        assert!(parsed.transcription.translate);
    }

    #[test]
    fn unknown_model_id_is_rejected() {
        let mut config = Config::default();
        config.model.active = "enormous".to_string();
        assert!(config.active_model().is_err());
    }
}
