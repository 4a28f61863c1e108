//! Audio transcoding pipeline
//!
//! Decoder → audio processors → encoder → muxer. Samples before the
//! stream start position are decoded but dropped before processing so the
//! output starts exactly at the clip start.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::classifier::PipelineKind;
use crate::codec::{AudioProcessor, Codec, CodecFactory};
use crate::error::Result;
use crate::format::Sample;
use crate::mime::{self, TrackType};
use crate::request::TransformationRequest;

use super::{output_mime_type, PipelineParams, SamplePipeline, TrackOutput};

/// Creates a fresh audio processor for each audio pipeline
pub type AudioProcessorFactory = Arc<dyn Fn() -> Box<dyn AudioProcessor> + Send + Sync>;

struct AudioChain {
    decoder: Box<dyn Codec>,
    processors: Vec<Box<dyn AudioProcessor>>,
    encoder: Box<dyn Codec>,
}

pub struct AudioTranscodePipeline {
    stream_start_position_us: i64,
    chain: Mutex<AudioChain>,
    output: TrackOutput,
}

impl AudioTranscodePipeline {
    pub fn new(
        params: PipelineParams,
        processor_factories: &[AudioProcessorFactory],
        codec_factory: &dyn CodecFactory,
    ) -> Result<Self> {
        let decoder = codec_factory.create_audio_decoder(&params.input_format)?;
        let processors: Vec<Box<dyn AudioProcessor>> =
            processor_factories.iter().map(|factory| factory()).collect();

        let processed_format = processors
            .iter()
            .fold(decoder.configuration_format().clone(), |format, p| {
                p.output_format(&format)
            });
        let output_mime = output_mime_type(
            params.request.audio_mime_type.as_deref(),
            params.input_format.mime(),
            params.muxer.as_ref(),
            mime::AUDIO_AAC,
        );
        let requested_format = processed_format.with_mime(&output_mime);
        let encoder = codec_factory.create_audio_encoder(&requested_format)?;

        let finalized = finalized_request(
            &params.request,
            requested_format.mime(),
            encoder.configuration_format().mime(),
        );
        params.fallback.on_transformation_request_finalized(&finalized)?;

        let output = TrackOutput::new(
            params.muxer,
            TrackType::Audio,
            encoder.configuration_format(),
            params.stream_offset_us,
        )?;

        tracing::debug!(
            input = ?params.input_format.mime(),
            output = ?encoder.configuration_format().mime(),
            processors = processors.len(),
            "Audio transcoding pipeline created"
        );

        Ok(Self {
            stream_start_position_us: params.stream_start_position_us,
            chain: Mutex::new(AudioChain {
                decoder,
                processors,
                encoder,
            }),
            output,
        })
    }
}

/// The request as the encoder will actually fulfil it
fn finalized_request(
    request: &TransformationRequest,
    requested_mime: Option<&str>,
    actual_mime: Option<&str>,
) -> TransformationRequest {
    if requested_mime == actual_mime {
        return request.clone();
    }
    TransformationRequest {
        audio_mime_type: actual_mime.map(str::to_string),
        ..request.clone()
    }
}

impl SamplePipeline for AudioTranscodePipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::TranscodeAudio
    }

    fn track_type(&self) -> TrackType {
        TrackType::Audio
    }

    fn queue_input(&self, sample: Sample) -> Result<()> {
        let mut chain = self.chain.lock();
        let AudioChain {
            decoder,
            processors,
            encoder,
        } = &mut *chain;

        decoder.queue_input(sample)?;
        while let Some(decoded) = decoder.dequeue_output()? {
            if decoded.end_of_stream {
                encoder.queue_input(decoded)?;
                continue;
            }
            if decoded.presentation_time_us < self.stream_start_position_us {
                continue;
            }
            let mut processed = decoded;
            for processor in processors.iter_mut() {
                processed = processor.process(processed)?;
            }
            encoder.queue_input(processed)?;
        }

        while let Some(encoded) = encoder.dequeue_output()? {
            self.output.write(encoded)?;
        }
        Ok(())
    }

    fn current_position_ms(&self) -> i64 {
        self.output.position_ms()
    }

    fn is_ended(&self) -> bool {
        self.output.is_ended()
    }

    fn release(&self) {
        let mut chain = self.chain.lock();
        chain.decoder.release();
        chain.encoder.release();
    }
}
