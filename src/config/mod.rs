//! Editor configuration loaded from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::model::EncodeSettings;
use crate::engine::DEFAULT_LOG_CAPACITY;
use crate::thumbnail::DEFAULT_QUALITY;
use crate::utils::logging::LoggingConfig;


/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete editor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub thumbnail: ThumbnailConfig,
    pub encode: EncodeSettings,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Still-frame capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Lossy quality factor in (0, 1]; thumbnails are always JPEG
    pub quality: f32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Codec runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Runtime executable, resolved through `PATH` when not absolute
    pub binary: String,
    /// Runtime log lines retained for diagnostics
    pub log_capacity: usize,
    /// Encoders the runtime must offer to be usable
    pub required_encoders: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            required_encoders: vec!["libx264".to_string(), "aac".to_string()],
        }
    }
}

impl EditorConfig {
    /// Read and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let quality = self.thumbnail.quality;
        if !quality.is_finite() || quality <= 0.0 || quality > 1.0 {
            return Err(ConfigError::Invalid(format!(
                "thumbnail.quality must be in (0, 1], got {}",
                quality
            )));
        }

        let encode = &self.encode;
        for (key, value) in [
            ("encode.video_codec", &encode.video_codec),
            ("encode.preset", &encode.preset),
            ("encode.audio_codec", &encode.audio_codec),
            ("encode.container", &encode.container),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
            }
        }
        if let Some(crf) = encode.crf {
            if crf > 51 {
                return Err(ConfigError::Invalid(format!("encode.crf must be 0-51, got {}", crf)));
            }
        }
        if encode.threads == Some(0) {
            return Err(ConfigError::Invalid("encode.threads must be at least 1".to_string()));
        }

        if self.engine.binary.trim().is_empty() {
            return Err(ConfigError::Invalid("engine.binary must not be empty".to_string()));
        }
        Ok(())
    }
}
