//! Video transcoding pipeline
//!
//! Decoder → effects → encoder → muxer. Effect failures are reported
//! straight to the job through the error reporter and the frame is
//! dropped; codec failures are returned to the caller.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::classifier::PipelineKind;
use crate::codec::{Codec, CodecFactory, Effect};
use crate::error::{Result, TransformationError};
use crate::format::{Format, Sample};
use crate::mime::{self, TrackType};
use crate::request::TransformationRequest;

use super::{output_mime_type, PipelineParams, SamplePipeline, TrackOutput};

/// Creates a fresh effect for each video pipeline
pub type EffectFactory = Arc<dyn Fn() -> Box<dyn Effect> + Send + Sync>;

/// Receives errors raised while processing frames
pub type ErrorReporter = Arc<dyn Fn(TransformationError) + Send + Sync>;

struct VideoChain {
    decoder: Box<dyn Codec>,
    effects: Vec<Box<dyn Effect>>,
    encoder: Box<dyn Codec>,
}

pub struct VideoTranscodePipeline {
    stream_start_position_us: i64,
    chain: Mutex<VideoChain>,
    output: TrackOutput,
    on_error: ErrorReporter,
}

impl VideoTranscodePipeline {
    pub fn new(
        params: PipelineParams,
        effect_factories: &[EffectFactory],
        codec_factory: &dyn CodecFactory,
        on_error: ErrorReporter,
    ) -> Result<Self> {
        let decoder = codec_factory.create_video_decoder(&params.input_format)?;
        let effects: Vec<Box<dyn Effect>> =
            effect_factories.iter().map(|factory| factory()).collect();

        let frame_format = effects
            .iter()
            .fold(upright(decoder.configuration_format()), |format, effect| {
                effect.output_format(&format)
            });
        let output_mime = output_mime_type(
            params.request.video_mime_type.as_deref(),
            params.input_format.mime(),
            params.muxer.as_ref(),
            mime::VIDEO_H264,
        );
        let requested_format =
            apply_request_geometry(&frame_format, &params.request).with_mime(&output_mime);
        let encoder = codec_factory.create_video_encoder(&requested_format, &params.request)?;

        let finalized = finalized_request(
            &params.request,
            &requested_format,
            encoder.configuration_format(),
        );
        params.fallback.on_transformation_request_finalized(&finalized)?;

        let output = TrackOutput::new(
            params.muxer,
            TrackType::Video,
            encoder.configuration_format(),
            params.stream_offset_us,
        )?;

        tracing::debug!(
            input = ?params.input_format.mime(),
            output = ?encoder.configuration_format().mime(),
            width = requested_format.width,
            height = requested_format.height,
            effects = effects.len(),
            "Video transcoding pipeline created"
        );

        Ok(Self {
            stream_start_position_us: params.stream_start_position_us,
            chain: Mutex::new(VideoChain {
                decoder,
                effects,
                encoder,
            }),
            output,
            on_error,
        })
    }
}

/// Decoded frames are rotated for display, so swap dimensions for
/// rotations that are not a multiple of 180 degrees.
fn upright(decoded: &Format) -> Format {
    let (width, height) = if decoded.rotation_degrees % 180 == 0 {
        (decoded.width, decoded.height)
    } else {
        (decoded.height, decoded.width)
    };
    Format {
        width,
        height,
        rotation_degrees: 0,
        ..decoded.clone()
    }
}

/// Frame size after the request's scale, rotation and output height
fn apply_request_geometry(frame: &Format, request: &TransformationRequest) -> Format {
    let mut width = (frame.width as f32 * request.scale_x).round() as u32;
    let mut height = (frame.height as f32 * request.scale_y).round() as u32;

    if (request.rotation_degrees.round() as i64).rem_euclid(180) == 90 {
        std::mem::swap(&mut width, &mut height);
    }

    if let Some(output_height) = request.output_height {
        if height > 0 {
            width = (width as f32 * output_height as f32 / height as f32).round() as u32;
        }
        height = output_height;
    }

    Format {
        width,
        height,
        pixel_width_height_ratio: 1.0,
        ..frame.clone()
    }
}

/// The request as the encoder will actually fulfil it
fn finalized_request(
    request: &TransformationRequest,
    requested: &Format,
    actual: &Format,
) -> TransformationRequest {
    let mut finalized = request.clone();
    if requested.mime() != actual.mime() {
        finalized.video_mime_type = actual.sample_mime_type.clone();
    }
    if requested.height != actual.height {
        finalized.output_height = Some(actual.height);
    }
    finalized
}

impl SamplePipeline for VideoTranscodePipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::TranscodeVideo
    }

    fn track_type(&self) -> TrackType {
        TrackType::Video
    }

    fn queue_input(&self, sample: Sample) -> Result<()> {
        let mut chain = self.chain.lock();
        let VideoChain {
            decoder,
            effects,
            encoder,
        } = &mut *chain;

        // Reported after the chain is unlocked; the listener may release us.
        let mut effect_error: Option<TransformationError> = None;
        decoder.queue_input(sample)?;
        'frames: while let Some(decoded) = decoder.dequeue_output()? {
            if decoded.end_of_stream {
                encoder.queue_input(decoded)?;
                continue;
            }
            if decoded.presentation_time_us < self.stream_start_position_us {
                continue;
            }
            let mut frame = decoded;
            for effect in effects.iter_mut() {
                frame = match effect.apply(frame) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, "Video effect failed, dropping frame");
                        if effect_error.is_none() {
                            effect_error = Some(e);
                        }
                        continue 'frames;
                    }
                };
            }
            encoder.queue_input(frame)?;
        }

        while let Some(encoded) = encoder.dequeue_output()? {
            self.output.write(encoded)?;
        }
        drop(chain);

        if let Some(e) = effect_error {
            (self.on_error)(e);
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
