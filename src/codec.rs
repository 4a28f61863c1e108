//! Codec and processing interfaces
//!
//! Decoders, encoders, audio processors and video effects are provided by
//! the caller. Transcoding pipelines drive them through these traits.

use crate::error::Result;
use crate::format::{Format, Sample};
use crate::request::TransformationRequest;

/// A decoder or encoder instance.
///
/// Queuing a sample with `end_of_stream` set flushes the codec. The last
/// sample returned by `dequeue_output` after that is also flagged
/// `end_of_stream`.
pub trait Codec: Send {
    /// Format the codec was actually configured with
    fn configuration_format(&self) -> &Format;

    fn queue_input(&mut self, sample: Sample) -> Result<()>;

    /// Take the next output sample, or `None` if more input is needed
    fn dequeue_output(&mut self) -> Result<Option<Sample>>;

    fn release(&mut self) {}
}

/// Creates codecs for transcoding pipelines
pub trait CodecFactory: Send + Sync {
    fn create_audio_decoder(&self, format: &Format) -> Result<Box<dyn Codec>>;

    fn create_video_decoder(&self, format: &Format) -> Result<Box<dyn Codec>>;

    /// Create an audio encoder as close to `requested` as the device allows
    fn create_audio_encoder(&self, requested: &Format) -> Result<Box<dyn Codec>>;

    /// Create a video encoder as close to `requested` as the device allows
    fn create_video_encoder(
        &self,
        requested: &Format,
        request: &TransformationRequest,
    ) -> Result<Box<dyn Codec>>;

    /// The encoder must re-encode audio whatever the input format
    fn audio_needs_encoding(&self) -> bool {
        false
    }

    /// The encoder must re-encode video whatever the input format
    fn video_needs_encoding(&self) -> bool {
        false
    }
}

/// Processes decoded audio between decoder and encoder
pub trait AudioProcessor: Send {
    /// Output format for the given input format
    fn output_format(&self, input: &Format) -> Format {
        input.clone()
    }

    fn process(&mut self, sample: Sample) -> Result<Sample>;
}

/// Processes decoded video frames between decoder and encoder
pub trait Effect: Send {
    /// Output format for the given input format
    fn output_format(&self, input: &Format) -> Format {
        input.clone()
    }

    fn apply(&mut self, frame: Sample) -> Result<Sample>;
}
