//! Transformer configuration

use serde::{Deserialize, Serialize};

use crate::fallback::{FallbackCallback, FallbackTracker};
use crate::request::TransformationRequest;

/// Encoder capability overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Re-encode audio whatever the input format
    pub audio_needs_encoding: bool,

    /// Re-encode video whatever the input format
    pub video_needs_encoding: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Transformer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Accept encoder fallbacks instead of failing the job
    pub fallback_enabled: bool,

    /// Requested output of every job
    pub request: TransformationRequest,

    /// Encoder configuration
    pub encoder: EncoderConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            request: TransformationRequest::default(),
            encoder: EncoderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TransformerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: TransformerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Fallback tracker for one job run with this configuration
    pub fn fallback_tracker(&self, on_fallback: FallbackCallback) -> FallbackTracker {
        FallbackTracker::new(self.request.clone(), self.fallback_enabled, on_fallback)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
