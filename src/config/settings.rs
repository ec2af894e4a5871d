//! Configuration settings for Klipp.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub acquisition: AcquisitionSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub clip: ClipSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory holding transcript files.
    pub subs_dir: String,
    /// Directory holding rendered clips and their temp files.
    pub clips_dir: String,
    /// Directory for temporary files (downloaded audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            subs_dir: "subs".to_string(),
            clips_dir: "gifs".to_string(),
            temp_dir: "/tmp/klipp".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Target subtitle/transcription language (ISO 639-1).
    pub language: String,
    /// Priming phrase for the transcription model. Falls back to a built-in
    /// phrase for the configured language when unset.
    pub initial_prompt: Option<String>,
    /// Whisper model for the transcription fallback.
    pub whisper_model: String,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum number of playlist entries to process (all when unset).
    pub playlist_limit: Option<usize>,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            initial_prompt: None,
            whisper_model: "whisper-1".to_string(),
            chunk_duration_seconds: 600,
            playlist_limit: None,
        }
    }
}

/// Embedding generation settings.
///
/// The same model serves index builds and queries; changing it invalidates
/// nothing on disk (the corpus is rebuilt in memory each run) but two
/// processes configured differently cannot share results meaningfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default number of results when the CLI flag is omitted.
    pub default_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { default_limit: 10 }
    }
}

/// Clip rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClipSettings {
    /// Font file for caption rendering. When unset or missing, a built-in
    /// search list of common system font locations is probed, and ffmpeg's
    /// default font is the last resort.
    pub font_path: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KlippError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("klipp")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded transcript store directory.
    pub fn subs_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.subs_dir)
    }

    /// Get the expanded clip cache directory.
    pub fn clips_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.clips_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.general.subs_dir, "subs");
        assert_eq!(settings.general.clips_dir, "gifs");
        assert_eq!(settings.acquisition.language, "en");
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
        assert_eq!(settings.search.default_limit, 10);
        assert!(settings.clip.font_path.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings =
            toml::from_str("[acquisition]\nlanguage = \"el\"\n").unwrap();
        assert_eq!(settings.acquisition.language, "el");
        assert_eq!(settings.general.subs_dir, "subs");
        assert_eq!(settings.embedding.dimensions, 1536);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.acquisition.language = "el".to_string();
        settings.clip.font_path = Some("/tmp/font.ttf".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.acquisition.language, "el");
        assert_eq!(loaded.clip.font_path.as_deref(), Some("/tmp/font.ttf"));
    }
}
