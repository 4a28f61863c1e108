//! Sample pipelines
//!
//! One pipeline exists per track. The loader pushes samples into it and
//! the pipeline pushes its output into the muxer:
//! - `PassthroughPipeline` copies samples, only shifting timestamps
//! - `AudioTranscodePipeline` decodes, runs audio processors, re-encodes
//! - `VideoTranscodePipeline` decodes, applies effects, re-encodes
//!
//! The current position is published atomically so progress can be read
//! from any thread without waiting for in-flight sample work.

pub mod audio;
pub mod passthrough;
pub mod video;

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

pub use audio::{AudioProcessorFactory, AudioTranscodePipeline};
pub use passthrough::PassthroughPipeline;
pub use video::{EffectFactory, ErrorReporter, VideoTranscodePipeline};

use crate::classifier::PipelineKind;
use crate::error::Result;
use crate::fallback::FallbackListener;
use crate::format::{Format, Sample};
use crate::mime::TrackType;
use crate::muxer::{Muxer, SinkCapabilities};
use crate::request::TransformationRequest;

/// Contract shared by all pipeline variants
pub trait SamplePipeline: Send + Sync {
    fn kind(&self) -> PipelineKind;

    fn track_type(&self) -> TrackType;

    /// Push one input sample. Never blocks on other tracks.
    fn queue_input(&self, sample: Sample) -> Result<()>;

    /// Media time of this track written so far, in milliseconds.
    /// Starts at 0 and never decreases.
    fn current_position_ms(&self) -> i64;

    /// End of stream reached the muxer
    fn is_ended(&self) -> bool;

    fn release(&self);
}

/// Everything a pipeline needs at construction
#[derive(Clone)]
pub struct PipelineParams {
    pub input_format: Format,
    pub stream_start_position_us: i64,
    pub stream_offset_us: i64,
    pub request: TransformationRequest,
    pub muxer: Arc<dyn Muxer>,
    pub fallback: Arc<dyn FallbackListener>,
}

/// Monotonic per-track position
#[derive(Debug, Default)]
pub struct PositionTracker {
    position_ms: AtomicI64,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the position forward to `time_us`; earlier times are ignored
    pub fn advance_to_us(&self, time_us: i64) {
        let ms = time_us.max(0) / 1000;
        self.position_ms.fetch_max(ms, Ordering::AcqRel);
    }

    pub fn position_ms(&self) -> i64 {
        self.position_ms.load(Ordering::Acquire)
    }
}

/// Writes a pipeline's output samples into the muxer
pub(crate) struct TrackOutput {
    muxer: Arc<dyn Muxer>,
    track_type: TrackType,
    stream_offset_us: i64,
    position: PositionTracker,
    ended: AtomicBool,
}

impl TrackOutput {
    pub(crate) fn new(
        muxer: Arc<dyn Muxer>,
        track_type: TrackType,
        output_format: &Format,
        stream_offset_us: i64,
    ) -> Result<Self> {
        muxer.add_track_format(track_type, output_format)?;
        Ok(Self {
            muxer,
            track_type,
            stream_offset_us,
            position: PositionTracker::new(),
            ended: AtomicBool::new(false),
        })
    }

    pub(crate) fn write(&self, mut sample: Sample) -> Result<()> {
        if self.is_ended() {
            return Ok(());
        }
        if sample.end_of_stream {
            self.muxer.end_track(self.track_type);
            self.ended.store(true, Ordering::Release);
            tracing::debug!(
                track_type = ?self.track_type,
                position_ms = self.position.position_ms(),
                "Track ended"
            );
            return Ok(());
        }
        sample.presentation_time_us = sample
            .presentation_time_us
            .saturating_sub(self.stream_offset_us);
        self.muxer.write_sample(self.track_type, &sample)?;
        self.position.advance_to_us(sample.presentation_time_us);
        Ok(())
    }

    pub(crate) fn track_type(&self) -> TrackType {
        self.track_type
    }

    pub(crate) fn position_ms(&self) -> i64 {
        self.position.position_ms()
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

/// Output MIME type for a transcoded track.
///
/// The requested type wins, then the input type; if the muxer takes
/// neither, `default_mime` is used.
pub(crate) fn output_mime_type(
    requested: Option<&str>,
    input: Option<&str>,
    muxer: &dyn Muxer,
    default_mime: &str,
) -> String {
    let candidate = requested.or(input);
    match candidate {
        Some(mime) if muxer.supports_sample_mime_type(Some(mime)) => mime.to_string(),
        _ => default_mime.to_string(),
    }
}
