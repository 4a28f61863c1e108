//! Configuration file support
//!
//! Loads transformer configuration from TOML files. Every section and key
//! is optional; missing values take the defaults of `TransformerConfig`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{EncoderConfig, LoggingConfig, TransformerConfig};
use crate::request::TransformationRequest;

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Requested output
    pub request: Option<TransformationRequest>,
    /// Fallback settings
    pub fallback: Option<FallbackSettings>,
    /// Encoder settings
    pub encoder: Option<EncoderSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// Accept encoder fallbacks
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Always re-encode audio
    pub audio_needs_encoding: Option<bool>,
    /// Always re-encode video
    pub video_needs_encoding: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        Self {
            request: Some(TransformationRequest::default()),
            fallback: Some(FallbackSettings {
                enabled: Some(true),
            }),
            encoder: Some(EncoderSettings {
                audio_needs_encoding: Some(false),
                video_needs_encoding: Some(false),
            }),
            logging: Some(LoggingSettings {
                level: Some("info".to_string()),
                format: Some("pretty".to_string()),
            }),
        }
    }

    /// Convert to TransformerConfig
    pub fn into_transformer_config(self) -> TransformerConfig {
        let defaults = TransformerConfig::default();
        let logging_defaults = LoggingConfig::default();
        TransformerConfig {
            request: self.request.unwrap_or(defaults.request),
            fallback_enabled: self
                .fallback
                .and_then(|f| f.enabled)
                .unwrap_or(defaults.fallback_enabled),
            encoder: EncoderConfig {
                audio_needs_encoding: self
                    .encoder
                    .as_ref()
                    .and_then(|e| e.audio_needs_encoding)
                    .unwrap_or(false),
                video_needs_encoding: self
                    .encoder
                    .as_ref()
                    .and_then(|e| e.video_needs_encoding)
                    .unwrap_or(false),
            },
            logging: LoggingConfig {
                level: self
                    .logging
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(logging_defaults.level),
                format: self
                    .logging
                    .and_then(|l| l.format)
                    .unwrap_or(logging_defaults.format),
            },
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(config.into_transformer_config(), TransformerConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let content = r#"
[request]
video_mime_type = "video/hevc"
output_height = 720

[fallback]
enabled = false

[logging]
format = "json"
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = ConfigFile::from_file(temp_file.path())
            .unwrap()
            .into_transformer_config();
        assert_eq!(config.request.video_mime_type.as_deref(), Some("video/hevc"));
        assert_eq!(config.request.output_height, Some(720));
        assert_eq!(config.request.scale_x, 1.0);
        assert!(!config.fallback_enabled);
        assert!(config.logging.is_json());
        assert_eq!(config.logging.level, "info");
        assert!(!config.encoder.audio_needs_encoding);
    }

    #[test]
    fn test_generate_default_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        generate_default_config(&path).unwrap();

        assert!(path.exists());
        let loaded = ConfigFile::from_file(&path).unwrap();
        assert_eq!(
            loaded.into_transformer_config(),
            TransformerConfig::default()
        );
    }
}
