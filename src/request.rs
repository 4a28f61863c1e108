//! Transformation request and media item description

use serde::{Deserialize, Serialize};

/// Output requirements for a transformation job.
///
/// The request is read-only while a job runs. `None` MIME types mean the
/// input codec is kept where the output allows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationRequest {
    pub audio_mime_type: Option<String>,
    pub video_mime_type: Option<String>,
    pub output_height: Option<u32>,
    pub rotation_degrees: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub enable_request_sdr_tone_mapping: bool,
    pub force_interpret_hdr_video_as_sdr: bool,
    pub flatten_for_slow_motion: bool,
}

impl Default for TransformationRequest {
    fn default() -> Self {
        Self {
            audio_mime_type: None,
            video_mime_type: None,
            output_height: None,
            rotation_degrees: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            enable_request_sdr_tone_mapping: false,
            force_interpret_hdr_video_as_sdr: false,
            flatten_for_slow_motion: false,
        }
    }
}

impl TransformationRequest {
    pub fn has_geometry_change(&self) -> bool {
        self.rotation_degrees != 0.0 || self.scale_x != 1.0 || self.scale_y != 1.0
    }
}

/// Clipping applied to the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClippingConfiguration {
    pub start_position_ms: i64,
    /// `None` means the clip runs to the end of the input
    pub end_position_ms: Option<i64>,
    /// Whether the clip start is known to fall on a key frame
    pub starts_at_key_frame: bool,
}

impl Default for ClippingConfiguration {
    fn default() -> Self {
        Self {
            start_position_ms: 0,
            end_position_ms: None,
            starts_at_key_frame: false,
        }
    }
}

/// Input to transform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaItem {
    pub uri: String,
    #[serde(default)]
    pub clipping: ClippingConfiguration,
}

impl MediaItem {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            clipping: ClippingConfiguration::default(),
        }
    }
}
