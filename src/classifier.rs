//! Track classifier - decides how each discovered track is processed
//!
//! A track is copied unchanged unless at least one rule requires a decode
//! and re-encode. Rules are checked in a fixed order and the first match
//! is reported as the reason.

use serde::Serialize;

use crate::format::Format;
use crate::mime::TrackType;
use crate::muxer::SinkCapabilities;
use crate::request::TransformationRequest;

/// Processing path of one track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    TranscodeAudio,
    TranscodeVideo,
    Passthrough,
}

/// First rule that forced a track to be transcoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeReason {
    /// Clip start is not on a key frame, so only a re-encode can cut exactly
    UnalignedClipStart,
    EncoderRequiresEncoding,
    SdrToneMapping,
    HdrInterpretedAsSdr,
    MimeTypeChange,
    UnsupportedBySink,
    SlowMotionFlattening,
    PixelAspectRatio,
    Rotation,
    Scale,
    OutputHeight,
    AudioProcessors,
    VideoEffects,
}

/// Processing configured for the job, outside the request itself
#[derive(Debug, Clone, Default)]
pub struct ProcessingOptions {
    pub audio_needs_encoding: bool,
    pub video_needs_encoding: bool,
    pub has_audio_processors: bool,
    pub has_video_effects: bool,
    pub clip_starts_at_key_frame: bool,
}

/// Outcome of classifying one track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub kind: PipelineKind,
    pub reason: Option<TranscodeReason>,
}

/// Decide the processing path for a track.
pub fn classify<S: SinkCapabilities + ?Sized>(
    format: &Format,
    request: &TransformationRequest,
    sink: &S,
    options: &ProcessingOptions,
    stream_start_position_us: i64,
    stream_offset_us: i64,
) -> Classification {
    let transcode = match format.track_type() {
        TrackType::Audio => audio_transcode_reason(format, request, sink, options)
            .map(|reason| (PipelineKind::TranscodeAudio, reason)),
        TrackType::Video => video_transcode_reason(
            format,
            request,
            sink,
            options,
            stream_start_position_us,
            stream_offset_us,
        )
        .map(|reason| (PipelineKind::TranscodeVideo, reason)),
        TrackType::Text | TrackType::Unknown => None,
    };

    match transcode {
        Some((kind, reason)) => Classification {
            kind,
            reason: Some(reason),
        },
        None => Classification {
            kind: PipelineKind::Passthrough,
            reason: None,
        },
    }
}

/// Why an audio track needs transcoding, or `None` to copy it
pub fn audio_transcode_reason<S: SinkCapabilities + ?Sized>(
    format: &Format,
    request: &TransformationRequest,
    sink: &S,
    options: &ProcessingOptions,
) -> Option<TranscodeReason> {
    if options.audio_needs_encoding {
        return Some(TranscodeReason::EncoderRequiresEncoding);
    }
    if let Some(reason) = mime_reason(request.audio_mime_type.as_deref(), format, sink) {
        return Some(reason);
    }
    if request.flatten_for_slow_motion && format.is_slow_motion() {
        return Some(TranscodeReason::SlowMotionFlattening);
    }
    if options.has_audio_processors {
        return Some(TranscodeReason::AudioProcessors);
    }
    None
}

/// Why a video track needs transcoding, or `None` to copy it
pub fn video_transcode_reason<S: SinkCapabilities + ?Sized>(
    format: &Format,
    request: &TransformationRequest,
    sink: &S,
    options: &ProcessingOptions,
    stream_start_position_us: i64,
    stream_offset_us: i64,
) -> Option<TranscodeReason> {
    if stream_start_position_us.saturating_sub(stream_offset_us) != 0
        && !options.clip_starts_at_key_frame
    {
        return Some(TranscodeReason::UnalignedClipStart);
    }
    if options.video_needs_encoding {
        return Some(TranscodeReason::EncoderRequiresEncoding);
    }
    if request.enable_request_sdr_tone_mapping {
        return Some(TranscodeReason::SdrToneMapping);
    }
    if request.force_interpret_hdr_video_as_sdr {
        return Some(TranscodeReason::HdrInterpretedAsSdr);
    }
    if let Some(reason) = mime_reason(request.video_mime_type.as_deref(), format, sink) {
        return Some(reason);
    }
    if format.pixel_width_height_ratio != 1.0 {
        return Some(TranscodeReason::PixelAspectRatio);
    }
    if request.rotation_degrees != 0.0 {
        return Some(TranscodeReason::Rotation);
    }
    if request.scale_x != 1.0 || request.scale_y != 1.0 {
        return Some(TranscodeReason::Scale);
    }
    if request
        .output_height
        .is_some_and(|height| height != format.decoded_height())
    {
        return Some(TranscodeReason::OutputHeight);
    }
    if options.has_video_effects {
        return Some(TranscodeReason::VideoEffects);
    }
    None
}

/// An explicit target MIME type must match the input; without one the sink
/// must accept the input MIME type as is.
fn mime_reason<S: SinkCapabilities + ?Sized>(
    requested: Option<&str>,
    format: &Format,
    sink: &S,
) -> Option<TranscodeReason> {
    match requested {
        Some(target) if Some(target) != format.mime() => Some(TranscodeReason::MimeTypeChange),
        Some(_) => None,
        None if !sink.supports_sample_mime_type(format.mime()) => {
            Some(TranscodeReason::UnsupportedBySink)
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{MetadataEntry, SlowMotionData};
    use crate::mime;
    use crate::muxer::ContainerCapabilities;

    fn aac() -> Format {
        Format::audio(mime::AUDIO_AAC, 48000, 2)
    }

    fn h264() -> Format {
        Format::video(mime::VIDEO_H264, 1280, 720)
    }

    fn classify_default(format: &Format, request: &TransformationRequest) -> Classification {
        classify(
            format,
            request,
            &ContainerCapabilities::mp4(),
            &ProcessingOptions::default(),
            0,
            0,
        )
    }

    #[test]
    fn test_audio_passthrough_when_nothing_changes() {
        let result = classify_default(&aac(), &TransformationRequest::default());
        assert_eq!(result.kind, PipelineKind::Passthrough);
        assert_eq!(result.reason, None);
    }

    #[test]
    fn test_audio_same_explicit_mime_is_passthrough() {
        let request = TransformationRequest {
            audio_mime_type: Some(mime::AUDIO_AAC.to_string()),
            ..Default::default()
        };
        assert_eq!(classify_default(&aac(), &request).kind, PipelineKind::Passthrough);
    }

    #[test]
    fn test_audio_mime_change() {
        let request = TransformationRequest {
            audio_mime_type: Some(mime::AUDIO_AMR_NB.to_string()),
            ..Default::default()
        };
        let result = classify_default(&aac(), &request);
        assert_eq!(result.kind, PipelineKind::TranscodeAudio);
        assert_eq!(result.reason, Some(TranscodeReason::MimeTypeChange));
    }

    #[test]
    fn test_audio_unsupported_by_sink() {
        let opus = Format::audio(mime::AUDIO_OPUS, 48000, 2);
        let result = classify_default(&opus, &TransformationRequest::default());
        assert_eq!(result.reason, Some(TranscodeReason::UnsupportedBySink));
    }

    #[test]
    fn test_audio_explicit_mime_skips_sink_check() {
        // Explicitly asking for the input codec is honoured even if the sink
        // would not pick it.
        let opus = Format::audio(mime::AUDIO_OPUS, 48000, 2);
        let request = TransformationRequest {
            audio_mime_type: Some(mime::AUDIO_OPUS.to_string()),
            ..Default::default()
        };
        assert_eq!(classify_default(&opus, &request).kind, PipelineKind::Passthrough);
    }

    #[test]
    fn test_audio_slow_motion_needs_flag_and_marker() {
        let mut format = aac();
        format
            .metadata
            .push(MetadataEntry::SlowMotion(SlowMotionData::default()));
        assert_eq!(
            classify_default(&format, &TransformationRequest::default()).kind,
            PipelineKind::Passthrough
        );

        let request = TransformationRequest {
            flatten_for_slow_motion: true,
            ..Default::default()
        };
        assert_eq!(
            classify_default(&format, &request).reason,
            Some(TranscodeReason::SlowMotionFlattening)
        );
        assert_eq!(classify_default(&aac(), &request).kind, PipelineKind::Passthrough);
    }

    #[test]
    fn test_audio_processors_force_transcode() {
        let options = ProcessingOptions {
            has_audio_processors: true,
            ..Default::default()
        };
        let result = classify(
            &aac(),
            &TransformationRequest::default(),
            &ContainerCapabilities::mp4(),
            &options,
            0,
            0,
        );
        assert_eq!(result.reason, Some(TranscodeReason::AudioProcessors));
    }

    #[test]
    fn test_encoder_requirement_checked_first() {
        let options = ProcessingOptions {
            audio_needs_encoding: true,
            has_audio_processors: true,
            ..Default::default()
        };
        let request = TransformationRequest {
            audio_mime_type: Some(mime::AUDIO_AMR_WB.to_string()),
            ..Default::default()
        };
        let result = classify(&aac(), &request, &ContainerCapabilities::mp4(), &options, 0, 0);
        assert_eq!(result.reason, Some(TranscodeReason::EncoderRequiresEncoding));
    }

    #[test]
    fn test_audio_options_do_not_affect_video() {
        let options = ProcessingOptions {
            audio_needs_encoding: true,
            has_audio_processors: true,
            ..Default::default()
        };
        let result = classify(
            &h264(),
            &TransformationRequest::default(),
            &ContainerCapabilities::mp4(),
            &options,
            0,
            0,
        );
        assert_eq!(result.kind, PipelineKind::Passthrough);
    }

    #[test]
    fn test_video_passthrough_when_nothing_changes() {
        let result = classify_default(&h264(), &TransformationRequest::default());
        assert_eq!(result.kind, PipelineKind::Passthrough);
    }

    #[test]
    fn test_video_unaligned_clip_start() {
        let sink = ContainerCapabilities::mp4();
        let request = TransformationRequest::default();
        let mut options = ProcessingOptions::default();

        let result = classify(&h264(), &request, &sink, &options, 2_000_000, 1_000_000);
        assert_eq!(result.reason, Some(TranscodeReason::UnalignedClipStart));

        // Offset cancels the start position
        let result = classify(&h264(), &request, &sink, &options, 1_000_000, 1_000_000);
        assert_eq!(result.kind, PipelineKind::Passthrough);

        options.clip_starts_at_key_frame = true;
        let result = classify(&h264(), &request, &sink, &options, 2_000_000, 1_000_000);
        assert_eq!(result.kind, PipelineKind::Passthrough);
    }

    #[test]
    fn test_video_extreme_offset_is_unaligned() {
        let sink = ContainerCapabilities::mp4();
        let request = TransformationRequest::default();
        let options = ProcessingOptions::default();

        let result = classify(&h264(), &request, &sink, &options, 0, i64::MIN);
        assert_eq!(result.reason, Some(TranscodeReason::UnalignedClipStart));
    }

    #[test]
    fn test_video_request_flags() {
        let cases = [
            (
                TransformationRequest {
                    enable_request_sdr_tone_mapping: true,
                    ..Default::default()
                },
                TranscodeReason::SdrToneMapping,
            ),
            (
                TransformationRequest {
                    force_interpret_hdr_video_as_sdr: true,
                    ..Default::default()
                },
                TranscodeReason::HdrInterpretedAsSdr,
            ),
            (
                TransformationRequest {
                    video_mime_type: Some(mime::VIDEO_H265.to_string()),
                    ..Default::default()
                },
                TranscodeReason::MimeTypeChange,
            ),
            (
                TransformationRequest {
                    rotation_degrees: 90.0,
                    ..Default::default()
                },
                TranscodeReason::Rotation,
            ),
            (
                TransformationRequest {
                    scale_x: 2.0,
                    ..Default::default()
                },
                TranscodeReason::Scale,
            ),
            (
                TransformationRequest {
                    scale_y: 0.5,
                    ..Default::default()
                },
                TranscodeReason::Scale,
            ),
        ];
        for (request, reason) in cases {
            let result = classify_default(&h264(), &request);
            assert_eq!(result.kind, PipelineKind::TranscodeVideo);
            assert_eq!(result.reason, Some(reason));
        }
    }

    #[test]
    fn test_video_unsupported_by_sink() {
        let vp9 = Format::video(mime::VIDEO_VP9, 1280, 720);
        let result = classify_default(&vp9, &TransformationRequest::default());
        assert_eq!(result.reason, Some(TranscodeReason::UnsupportedBySink));
    }

    #[test]
    fn test_pixel_aspect_ratio_always_transcodes() {
        let mut format = h264();
        format.pixel_width_height_ratio = 1.333;
        let request = TransformationRequest {
            video_mime_type: Some(mime::VIDEO_H264.to_string()),
            ..Default::default()
        };
        let options = ProcessingOptions {
            clip_starts_at_key_frame: true,
            ..Default::default()
        };
        let result = classify(&format, &request, &ContainerCapabilities::mp4(), &options, 0, 0);
        assert_eq!(result.kind, PipelineKind::TranscodeVideo);
        assert_eq!(result.reason, Some(TranscodeReason::PixelAspectRatio));
    }

    #[test]
    fn test_output_height_uses_decoded_height() {
        let request = TransformationRequest {
            output_height: Some(720),
            ..Default::default()
        };
        assert_eq!(classify_default(&h264(), &request).kind, PipelineKind::Passthrough);

        // Portrait video stored as landscape: decoded height is the width
        let mut rotated = h264();
        rotated.rotation_degrees = 90;
        let result = classify_default(&rotated, &request);
        assert_eq!(result.reason, Some(TranscodeReason::OutputHeight));

        let request = TransformationRequest {
            output_height: Some(1280),
            ..Default::default()
        };
        assert_eq!(classify_default(&rotated, &request).kind, PipelineKind::Passthrough);
    }

    #[test]
    fn test_video_effects_force_transcode() {
        let options = ProcessingOptions {
            has_video_effects: true,
            ..Default::default()
        };
        let result = classify(
            &h264(),
            &TransformationRequest::default(),
            &ContainerCapabilities::mp4(),
            &options,
            0,
            0,
        );
        assert_eq!(result.reason, Some(TranscodeReason::VideoEffects));
    }

    #[test]
    fn test_text_track_is_passthrough() {
        let text = Format {
            sample_mime_type: Some(mime::TEXT_VTT.to_string()),
            ..Default::default()
        };
        let options = ProcessingOptions {
            audio_needs_encoding: true,
            video_needs_encoding: true,
            ..Default::default()
        };
        let result = classify(
            &text,
            &TransformationRequest::default(),
            &ContainerCapabilities::mp4(),
            &options,
            0,
            0,
        );
        assert_eq!(result.kind, PipelineKind::Passthrough);
    }
}
