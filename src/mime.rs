//! Sample MIME types
//!
//! The track type of a format is derived from the top-level MIME type.

use serde::{Deserialize, Serialize};

pub const AUDIO_AAC: &str = "audio/mp4a-latm";
pub const AUDIO_AMR_NB: &str = "audio/3gpp";
pub const AUDIO_AMR_WB: &str = "audio/amr-wb";
pub const AUDIO_OPUS: &str = "audio/opus";
pub const AUDIO_VORBIS: &str = "audio/vorbis";
pub const AUDIO_RAW: &str = "audio/raw";

pub const VIDEO_H263: &str = "video/3gpp";
pub const VIDEO_H264: &str = "video/avc";
pub const VIDEO_H265: &str = "video/hevc";
pub const VIDEO_MP4V: &str = "video/mp4v-es";
pub const VIDEO_VP9: &str = "video/x-vnd.on2.vp9";
pub const VIDEO_AV1: &str = "video/av01";

pub const TEXT_VTT: &str = "text/vtt";

/// Media kind of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Audio,
    Video,
    Text,
    Unknown,
}

/// Get the track type for a sample MIME type
pub fn track_type(mime: Option<&str>) -> TrackType {
    let top_level = mime.and_then(|m| m.split('/').next());
    match top_level {
        Some("audio") => TrackType::Audio,
        Some("video") => TrackType::Video,
        Some("text") | Some("application") => TrackType::Text,
        _ => TrackType::Unknown,
    }
}

pub fn is_audio(mime: Option<&str>) -> bool {
    track_type(mime) == TrackType::Audio
}

pub fn is_video(mime: Option<&str>) -> bool {
    track_type(mime) == TrackType::Video
}
