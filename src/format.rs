//! Track formats and samples
//!
//! A `Format` is supplied once per track when the loader discovers it and
//! is never modified afterwards. `Sample` is the unit pushed through a
//! sample pipeline.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::mime::{self, TrackType};

/// Slow motion segment information found in a track's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowMotionSegment {
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    /// Playback speed divisor (e.g. 4 for quarter speed)
    pub speed_divisor: u32,
}

/// Slow motion marker attached to a track
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlowMotionData {
    pub segments: Vec<SlowMotionSegment>,
}

/// A single metadata entry of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetadataEntry {
    SlowMotion(SlowMotionData),
    Text { key: String, value: String },
}

/// Format of one input track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    pub sample_mime_type: Option<String>,
    pub width: u32,
    pub height: u32,
    pub pixel_width_height_ratio: f32,
    pub rotation_degrees: u32,
    pub sample_rate: u32,
    pub channel_count: u16,
    pub metadata: Vec<MetadataEntry>,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            sample_mime_type: None,
            width: 0,
            height: 0,
            pixel_width_height_ratio: 1.0,
            rotation_degrees: 0,
            sample_rate: 0,
            channel_count: 0,
            metadata: Vec::new(),
        }
    }
}

impl Format {
    /// Create an audio format
    pub fn audio(mime: &str, sample_rate: u32, channel_count: u16) -> Self {
        Self {
            sample_mime_type: Some(mime.to_string()),
            sample_rate,
            channel_count,
            ..Default::default()
        }
    }

    /// Create a video format
    pub fn video(mime: &str, width: u32, height: u32) -> Self {
        Self {
            sample_mime_type: Some(mime.to_string()),
            width,
            height,
            ..Default::default()
        }
    }

    pub fn mime(&self) -> Option<&str> {
        self.sample_mime_type.as_deref()
    }

    pub fn track_type(&self) -> TrackType {
        mime::track_type(self.mime())
    }

    pub fn with_mime(&self, mime: &str) -> Self {
        Self {
            sample_mime_type: Some(mime.to_string()),
            ..self.clone()
        }
    }

    /// Height of the frames as they come out of the decoder.
    ///
    /// Decoders rotate frames for display, so a rotation that is not a
    /// multiple of 180 degrees swaps width and height.
    pub fn decoded_height(&self) -> u32 {
        if self.rotation_degrees % 180 == 0 {
            self.height
        } else {
            self.width
        }
    }

    /// Check if the metadata contains a slow motion marker
    pub fn is_slow_motion(&self) -> bool {
        self.metadata
            .iter()
            .any(|entry| matches!(entry, MetadataEntry::SlowMotion(_)))
    }
}

/// One compressed or decoded media sample
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub data: Bytes,
    pub presentation_time_us: i64,
    pub key_frame: bool,
    pub end_of_stream: bool,
}

impl Sample {
    pub fn new(data: impl Into<Bytes>, presentation_time_us: i64, key_frame: bool) -> Self {
        Self {
            data: data.into(),
            presentation_time_us,
            key_frame,
            end_of_stream: false,
        }
    }

    /// Empty sample that marks the end of a track
    pub fn end_of_stream(presentation_time_us: i64) -> Self {
        Self {
            data: Bytes::new(),
            presentation_time_us,
            key_frame: false,
            end_of_stream: true,
        }
    }
}
