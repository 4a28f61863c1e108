//! Offline track planning
//!
//! Classifies a list of track descriptions without running a job. Used by
//! the command line tool to show which tracks would be copied and which
//! would be transcoded, and why.

use serde::{Deserialize, Serialize};

use crate::classifier::{classify, PipelineKind, ProcessingOptions, TranscodeReason};
use crate::config::TransformerConfig;
use crate::format::Format;
use crate::mime::TrackType;
use crate::muxer::SinkCapabilities;

/// One input track as a loader would report it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescription {
    pub format: Format,
    #[serde(default)]
    pub stream_start_position_us: i64,
    #[serde(default)]
    pub stream_offset_us: i64,
}

/// Planned processing of one track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPlan {
    pub index: usize,
    pub track_type: TrackType,
    pub mime: Option<String>,
    pub kind: PipelineKind,
    pub reason: Option<TranscodeReason>,
}

/// Classify every track against `sink` with the configured request
pub fn plan_tracks<S: SinkCapabilities + ?Sized>(
    tracks: &[TrackDescription],
    config: &TransformerConfig,
    sink: &S,
    clip_starts_at_key_frame: bool,
) -> Vec<TrackPlan> {
    let options = ProcessingOptions {
        audio_needs_encoding: config.encoder.audio_needs_encoding,
        video_needs_encoding: config.encoder.video_needs_encoding,
        clip_starts_at_key_frame,
        ..Default::default()
    };

    tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let classification = classify(
                &track.format,
                &config.request,
                sink,
                &options,
                track.stream_start_position_us,
                track.stream_offset_us,
            );
            TrackPlan {
                index,
                track_type: track.format.track_type(),
                mime: track.format.sample_mime_type.clone(),
                kind: classification.kind,
                reason: classification.reason,
            }
        })
        .collect()
}
