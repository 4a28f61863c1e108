//! Output muxer interface
//!
//! The muxer writes the output container. The transformer only registers
//! tracks and asks which sample MIME types can be written without
//! transcoding; pipelines push their output samples into it.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::format::{Format, Sample};
use crate::mime::{self, TrackType};

/// Which sample formats an output can take without re-encoding
pub trait SinkCapabilities {
    fn supports_sample_mime_type(&self, mime: Option<&str>) -> bool;
}

pub trait Muxer: SinkCapabilities + Send + Sync {
    /// Announce that one more track will be written
    fn register_track(&self);

    /// Set the output format of a track before its first sample
    fn add_track_format(&self, track_type: TrackType, format: &Format) -> Result<()>;

    fn write_sample(&self, track_type: TrackType, sample: &Sample) -> Result<()>;

    /// No more samples will be written for this track
    fn end_track(&self, track_type: TrackType);
}

/// Fixed list of sample MIME types accepted by an output container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerCapabilities {
    pub mime_types: Vec<String>,
}

impl ContainerCapabilities {
    /// Sample formats an MP4 container can hold
    pub fn mp4() -> Self {
        Self {
            mime_types: [
                mime::AUDIO_AAC,
                mime::AUDIO_AMR_NB,
                mime::AUDIO_AMR_WB,
                mime::VIDEO_H263,
                mime::VIDEO_H264,
                mime::VIDEO_H265,
                mime::VIDEO_MP4V,
                mime::VIDEO_AV1,
            ]
            .iter()
            .map(|m| m.to_string())
            .collect(),
        }
    }
}

impl Default for ContainerCapabilities {
    fn default() -> Self {
        Self::mp4()
    }
}

impl SinkCapabilities for ContainerCapabilities {
    fn supports_sample_mime_type(&self, mime: Option<&str>) -> bool {
        mime.map(|m| self.mime_types.iter().any(|supported| supported == m))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp4_capabilities() {
        let caps = ContainerCapabilities::mp4();
        assert!(caps.supports_sample_mime_type(Some(mime::AUDIO_AAC)));
        assert!(caps.supports_sample_mime_type(Some(mime::VIDEO_H264)));
        assert!(!caps.supports_sample_mime_type(Some(mime::AUDIO_OPUS)));
        assert!(!caps.supports_sample_mime_type(None));
    }
}
