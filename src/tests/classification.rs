//! Track planning scenarios
//!
//! Mixed inputs as a loader would report them, planned against an MP4
//! output with different configurations.

use crate::classifier::{PipelineKind, TranscodeReason};
use crate::config::TransformerConfig;
use crate::config_file::ConfigFile;
use crate::format::Format;
use crate::mime::{self, TrackType};
use crate::muxer::ContainerCapabilities;
use crate::plan::{plan_tracks, TrackDescription};

fn track(format: Format) -> TrackDescription {
    TrackDescription {
        format,
        stream_start_position_us: 0,
        stream_offset_us: 0,
    }
}

fn mixed_input() -> Vec<TrackDescription> {
    vec![
        track(Format::video(mime::VIDEO_H264, 1920, 1080)),
        track(Format::audio(mime::AUDIO_AAC, 48000, 2)),
        track(Format::audio(mime::AUDIO_OPUS, 48000, 2)),
        track(Format {
            sample_mime_type: Some(mime::TEXT_VTT.to_string()),
            ..Default::default()
        }),
    ]
}

#[test]
fn test_default_config_copies_compatible_tracks() {
    let plans = plan_tracks(
        &mixed_input(),
        &TransformerConfig::default(),
        &ContainerCapabilities::mp4(),
        false,
    );

    let kinds: Vec<PipelineKind> = plans.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PipelineKind::Passthrough,
            PipelineKind::Passthrough,
            PipelineKind::TranscodeAudio,
            PipelineKind::Passthrough,
        ]
    );
    assert_eq!(plans[2].reason, Some(TranscodeReason::UnsupportedBySink));
    assert_eq!(plans[3].track_type, TrackType::Text);
}

#[test]
fn test_configured_request_changes_plan() {
    let content = r#"
[request]
output_height = 720

[encoder]
audio_needs_encoding = true
"#;
    let config = toml::from_str::<ConfigFile>(content)
        .unwrap()
        .into_transformer_config();
    let plans = plan_tracks(&mixed_input(), &config, &ContainerCapabilities::mp4(), false);

    assert_eq!(plans[0].kind, PipelineKind::TranscodeVideo);
    assert_eq!(plans[0].reason, Some(TranscodeReason::OutputHeight));
    assert_eq!(plans[1].reason, Some(TranscodeReason::EncoderRequiresEncoding));
    assert_eq!(plans[2].reason, Some(TranscodeReason::EncoderRequiresEncoding));
    assert_eq!(plans[3].kind, PipelineKind::Passthrough);
}

#[test]
fn test_clip_start_alignment() {
    let clipped = vec![TrackDescription {
        format: Format::video(mime::VIDEO_H264, 1280, 720),
        stream_start_position_us: 2_000_000,
        stream_offset_us: 0,
    }];
    let config = TransformerConfig::default();
    let sink = ContainerCapabilities::mp4();

    let plans = plan_tracks(&clipped, &config, &sink, false);
    assert_eq!(plans[0].reason, Some(TranscodeReason::UnalignedClipStart));

    let plans = plan_tracks(&clipped, &config, &sink, true);
    assert_eq!(plans[0].kind, PipelineKind::Passthrough);
}

#[test]
fn test_tracks_from_json() {
    let json = r#"[
        {"format": {"sample_mime_type": "video/avc", "width": 640, "height": 480,
                    "pixel_width_height_ratio": 1.5}},
        {"format": {"sample_mime_type": "audio/mp4a-latm", "sample_rate": 44100,
                    "channel_count": 2}, "stream_offset_us": 1000}
    ]"#;
    let tracks: Vec<TrackDescription> = serde_json::from_str(json).unwrap();
    let plans = plan_tracks(
        &tracks,
        &TransformerConfig::default(),
        &ContainerCapabilities::mp4(),
        false,
    );

    assert_eq!(plans[0].reason, Some(TranscodeReason::PixelAspectRatio));
    assert_eq!(plans[1].kind, PipelineKind::Passthrough);

    let line = serde_json::to_string(&plans[0]).unwrap();
    assert!(line.contains(r#""kind":"transcode_video""#));
    assert!(line.contains(r#""reason":"pixel_aspect_ratio""#));
}
