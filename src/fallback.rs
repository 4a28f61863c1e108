//! Fallback tracking
//!
//! Encoders may not support exactly what was requested. Every pipeline
//! reports the request it actually ended up with; once all registered
//! tracks have reported, the merged result is compared to the original
//! request and a fallback notification is emitted if they differ.

use parking_lot::Mutex;

use crate::error::{Result, TransformationError};
use crate::request::TransformationRequest;

/// Receives track registrations and finalized per-track requests
pub trait FallbackListener: Send + Sync {
    /// One more track will report a finalized request
    fn register_track(&self);

    /// Called exactly once by every sample pipeline during construction
    fn on_transformation_request_finalized(&self, finalized: &TransformationRequest)
        -> Result<()>;
}

/// Invoked with the original and the fallback request
pub type FallbackCallback =
    Box<dyn Fn(&TransformationRequest, &TransformationRequest) + Send + Sync>;

struct FallbackState {
    pending_tracks: usize,
    fallback: TransformationRequest,
}

/// Merges finalized requests of all tracks of one job
pub struct FallbackTracker {
    original: TransformationRequest,
    fallback_enabled: bool,
    on_fallback: FallbackCallback,
    state: Mutex<FallbackState>,
}

impl FallbackTracker {
    pub fn new(
        original: TransformationRequest,
        fallback_enabled: bool,
        on_fallback: FallbackCallback,
    ) -> Self {
        Self {
            state: Mutex::new(FallbackState {
                pending_tracks: 0,
                fallback: original.clone(),
            }),
            original,
            fallback_enabled,
            on_fallback,
        }
    }

    /// Merged request so far
    pub fn fallback_request(&self) -> TransformationRequest {
        self.state.lock().fallback.clone()
    }
}

impl FallbackListener for FallbackTracker {
    fn register_track(&self) {
        self.state.lock().pending_tracks += 1;
    }

    fn on_transformation_request_finalized(
        &self,
        finalized: &TransformationRequest,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.pending_tracks == 0 {
            return Err(TransformationError::Unexpected {
                source: "finalized request reported for an unregistered track".into(),
            });
        }
        state.pending_tracks -= 1;

        let original = &self.original;
        let fallback = &mut state.fallback;
        if finalized.audio_mime_type != original.audio_mime_type {
            fallback.audio_mime_type = finalized.audio_mime_type.clone();
        }
        if finalized.video_mime_type != original.video_mime_type {
            fallback.video_mime_type = finalized.video_mime_type.clone();
        }
        if finalized.output_height != original.output_height {
            fallback.output_height = finalized.output_height;
        }
        if finalized.enable_request_sdr_tone_mapping != original.enable_request_sdr_tone_mapping {
            fallback.enable_request_sdr_tone_mapping = finalized.enable_request_sdr_tone_mapping;
        }

        if state.pending_tracks > 0 || state.fallback == self.original {
            return Ok(());
        }

        if !self.fallback_enabled {
            let mime = state
                .fallback
                .video_mime_type
                .clone()
                .or_else(|| state.fallback.audio_mime_type.clone())
                .unwrap_or_default();
            tracing::warn!(mime = %mime, "Encoder fallback required but disabled");
            return Err(TransformationError::OutputFormatUnsupported { mime });
        }

        let fallback = state.fallback.clone();
        drop(state);
        tracing::info!(
            fallback = ?fallback,
            "Transformation request changed by encoder fallback"
        );
        (self.on_fallback)(&self.original, &fallback);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn tracker(enabled: bool, calls: Arc<AtomicUsize>) -> FallbackTracker {
        FallbackTracker::new(
            TransformationRequest {
                video_mime_type: Some(mime::VIDEO_H265.to_string()),
                output_height: Some(1080),
                ..Default::default()
            },
            enabled,
            Box::new(move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_no_fallback_when_request_met() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tracker = tracker(true, calls.clone());
        tracker.register_track();
        tracker.register_track();

        let original = tracker.original.clone();
        tracker.on_transformation_request_finalized(&original).unwrap();
        tracker.on_transformation_request_finalized(&original).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_reported_after_last_track() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tracker = tracker(true, calls.clone());
        tracker.register_track();
        tracker.register_track();

        let video = TransformationRequest {
            video_mime_type: Some(mime::VIDEO_H264.to_string()),
            output_height: Some(720),
            ..Default::default()
        };
        tracker.on_transformation_request_finalized(&video).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let audio = tracker.original.clone();
        tracker.on_transformation_request_finalized(&audio).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let fallback = tracker.fallback_request();
        assert_eq!(fallback.video_mime_type.as_deref(), Some(mime::VIDEO_H264));
        assert_eq!(fallback.output_height, Some(720));
    }

    #[test]
    fn test_disabled_fallback_is_an_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tracker = tracker(false, calls.clone());
        tracker.register_track();

        let video = TransformationRequest {
            video_mime_type: Some(mime::VIDEO_H264.to_string()),
            output_height: Some(1080),
            ..Default::default()
        };
        let err = tracker.on_transformation_request_finalized(&video).unwrap_err();
        assert!(matches!(err, TransformationError::OutputFormatUnsupported { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_can_read_merged_request() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let recorded = seen.clone();
        let tracker = Arc::new_cyclic(|weak: &std::sync::Weak<FallbackTracker>| {
            let weak = weak.clone();
            FallbackTracker::new(
                TransformationRequest::default(),
                true,
                Box::new(move |_, _| {
                    if let Some(tracker) = weak.upgrade() {
                        *recorded.lock() = Some(tracker.fallback_request());
                    }
                }),
            )
        });
        tracker.register_track();

        let finalized = TransformationRequest {
            audio_mime_type: Some(mime::AUDIO_AAC.to_string()),
            ..Default::default()
        };
        tracker.on_transformation_request_finalized(&finalized).unwrap();

        let merged = seen.lock().clone().unwrap();
        assert_eq!(merged.audio_mime_type.as_deref(), Some(mime::AUDIO_AAC));
    }

    #[test]
    fn test_unregistered_track_is_rejected() {
        let tracker = tracker(true, Arc::new(AtomicUsize::new(0)));
        let original = tracker.original.clone();
        assert!(tracker.on_transformation_request_finalized(&original).is_err());
    }
}
