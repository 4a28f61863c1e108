//! Passthrough pipeline - copies samples without decoding

use crate::classifier::PipelineKind;
use crate::error::Result;
use crate::format::Sample;
use crate::mime::TrackType;

use super::{PipelineParams, SamplePipeline, TrackOutput};

pub struct PassthroughPipeline {
    output: TrackOutput,
}

impl PassthroughPipeline {
    pub fn new(params: PipelineParams) -> Result<Self> {
        // Nothing is re-encoded, so the request is met as given.
        params
            .fallback
            .on_transformation_request_finalized(&params.request)?;

        let track_type = params.input_format.track_type();
        let output = TrackOutput::new(
            params.muxer,
            track_type,
            &params.input_format,
            params.stream_offset_us,
        )?;
        Ok(Self { output })
    }
}

impl SamplePipeline for PassthroughPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Passthrough
    }

    fn track_type(&self) -> TrackType {
        self.output.track_type()
    }

    fn queue_input(&self, sample: Sample) -> Result<()> {
        self.output.write(sample)
    }

    fn current_position_ms(&self) -> i64 {
        self.output.position_ms()
    }

    fn is_ended(&self) -> bool {
        self.output.is_ended()
    }

    fn release(&self) {}
}
