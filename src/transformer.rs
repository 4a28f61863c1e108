//! Transformation job orchestration
//!
//! `Transformer` owns the job state: progress phase, duration and the
//! registry of sample pipelines. For every job it hands a `TrackRouter`
//! to the loader. The router classifies each discovered track, builds
//! and registers its pipeline, and turns loader and pipeline events into
//! exactly one completion or error callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::classifier::{classify, PipelineKind, ProcessingOptions};
use crate::codec::CodecFactory;
use crate::error::{BoxError, Result, TransformationError};
use crate::fallback::FallbackListener;
use crate::format::Format;
use crate::loader::{AssetLoader, AssetLoaderListener};
use crate::muxer::Muxer;
use crate::pipeline::{
    AudioProcessorFactory, AudioTranscodePipeline, EffectFactory, ErrorReporter,
    PassthroughPipeline, PipelineParams, SamplePipeline, VideoTranscodePipeline,
};
use crate::progress::{JobProgress, ProgressSnapshot, ProgressState};
use crate::registry::PipelineRegistry;
use crate::request::{MediaItem, TransformationRequest};

/// Job-level outcome callbacks; each job calls exactly one of them once
pub trait TransformerListener: Send + Sync {
    fn on_transformation_completed(&self);

    fn on_transformation_error(&self, error: TransformationError);
}

/// What to do with the tracks of every job run by a transformer
pub struct TransformerSettings {
    pub request: TransformationRequest,
    pub audio_processors: Vec<AudioProcessorFactory>,
    pub video_effects: Vec<EffectFactory>,
    pub codec_factory: Arc<dyn CodecFactory>,
}

impl TransformerSettings {
    pub fn new(request: TransformationRequest, codec_factory: Arc<dyn CodecFactory>) -> Self {
        Self {
            request,
            audio_processors: Vec::new(),
            video_effects: Vec::new(),
            codec_factory,
        }
    }

    pub fn with_audio_processor(mut self, factory: AudioProcessorFactory) -> Self {
        self.audio_processors.push(factory);
        self
    }

    pub fn with_video_effect(mut self, factory: EffectFactory) -> Self {
        self.video_effects.push(factory);
        self
    }

    fn processing_options(&self, media_item: &MediaItem) -> ProcessingOptions {
        ProcessingOptions {
            audio_needs_encoding: self.codec_factory.audio_needs_encoding(),
            video_needs_encoding: self.codec_factory.video_needs_encoding(),
            has_audio_processors: !self.audio_processors.is_empty(),
            has_video_effects: !self.video_effects.is_empty(),
            clip_starts_at_key_frame: media_item.clipping.starts_at_key_frame,
        }
    }
}

/// Thread-safe progress reader that can be moved to a polling thread
#[derive(Clone)]
pub struct ProgressHandle {
    progress: Arc<JobProgress>,
    registry: Arc<PipelineRegistry>,
}

impl ProgressHandle {
    pub fn progress(&self) -> ProgressSnapshot {
        if self.progress.state() != ProgressState::Available {
            return self.progress.snapshot(0);
        }
        self.progress
            .snapshot(self.registry.aggregate_position_ms())
    }
}

/// Single-use latch: only the first terminal event passes
#[derive(Debug, Default)]
pub struct TerminalLatch {
    fired: AtomicBool,
}

impl TerminalLatch {
    /// Returns true for the first caller only
    pub fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Per-job identity and terminal event delivery
struct JobContext {
    id: Uuid,
    span: tracing::Span,
    listener: Arc<dyn TransformerListener>,
    latch: TerminalLatch,
    released: AtomicBool,
}

impl JobContext {
    fn new(listener: Arc<dyn TransformerListener>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            span: tracing::info_span!("transformation", job_id = %id),
            listener,
            latch: TerminalLatch::default(),
            released: AtomicBool::new(false),
        }
    }

    fn is_active(&self) -> bool {
        !self.released.load(Ordering::Acquire) && !self.latch.is_fired()
    }

    fn release(&self) {
        self.released.store(true, Ordering::Release);
    }

    fn complete(&self) {
        let _span = self.span.enter();
        if self.released.load(Ordering::Acquire) {
            tracing::debug!("Completion after release ignored");
            return;
        }
        if !self.latch.try_fire() {
            tracing::warn!("Completion after terminal event ignored");
            return;
        }
        tracing::info!("Transformation completed");
        self.listener.on_transformation_completed();
    }

    fn fail(&self, error: TransformationError) {
        let _span = self.span.enter();
        if self.released.load(Ordering::Acquire) {
            tracing::debug!(error = %error, "Error after release ignored");
            return;
        }
        if !self.latch.try_fire() {
            tracing::warn!(error = %error, "Error after terminal event ignored");
            return;
        }
        tracing::warn!(
            code = error.error_code().as_u16(),
            error = %error,
            "Transformation failed"
        );
        self.listener.on_transformation_error(error);
    }
}

/// Runs transformation jobs, one at a time
pub struct Transformer {
    settings: Arc<TransformerSettings>,
    loader: Box<dyn AssetLoader>,
    progress: Arc<JobProgress>,
    registry: Arc<PipelineRegistry>,
    job: Option<Arc<JobContext>>,
}

impl Transformer {
    pub fn new(settings: TransformerSettings, loader: Box<dyn AssetLoader>) -> Self {
        Self {
            settings: Arc::new(settings),
            loader,
            progress: Arc::new(JobProgress::new()),
            registry: Arc::new(PipelineRegistry::new()),
            job: None,
        }
    }

    /// Start a job and return its id.
    ///
    /// A job that is still running is released first. The loader may
    /// report events from inside this call.
    pub fn start(
        &mut self,
        media_item: MediaItem,
        muxer: Arc<dyn Muxer>,
        listener: Arc<dyn TransformerListener>,
        fallback: Arc<dyn FallbackListener>,
    ) -> Uuid {
        if self.job.is_some() {
            self.teardown();
        }
        self.registry.clear();
        self.progress.start();

        let job = Arc::new(JobContext::new(listener));
        let id = job.id;
        self.job = Some(job.clone());

        let router = TrackRouter {
            options: self.settings.processing_options(&media_item),
            settings: self.settings.clone(),
            job,
            muxer,
            fallback,
            progress: self.progress.clone(),
            registry: self.registry.clone(),
            track_registered: AtomicBool::new(false),
        };

        tracing::info!(job_id = %id, uri = %media_item.uri, "Transformation started");
        self.loader.start(&media_item, Arc::new(router));
        id
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress_handle().progress()
    }

    pub fn progress_handle(&self) -> ProgressHandle {
        ProgressHandle {
            progress: self.progress.clone(),
            registry: self.registry.clone(),
        }
    }

    /// Stop bookkeeping and ask the loader to release. Events that arrive
    /// afterwards are ignored.
    pub fn release(&mut self) {
        self.teardown();
        self.progress.reset();
    }

    fn teardown(&mut self) {
        if let Some(job) = self.job.take() {
            job.release();
            tracing::info!(job_id = %job.id, "Transformation released");
        }
        self.registry.release_all();
        self.loader.release();
    }

    /// Number of pipelines of the current job
    pub fn active_pipeline_count(&self) -> usize {
        self.registry.len()
    }
}

/// Loader listener for one job
struct TrackRouter {
    job: Arc<JobContext>,
    settings: Arc<TransformerSettings>,
    options: ProcessingOptions,
    muxer: Arc<dyn Muxer>,
    fallback: Arc<dyn FallbackListener>,
    progress: Arc<JobProgress>,
    registry: Arc<PipelineRegistry>,
    track_registered: AtomicBool,
}

impl TrackRouter {
    fn create_pipeline(
        &self,
        kind: PipelineKind,
        params: PipelineParams,
    ) -> Result<Arc<dyn SamplePipeline>> {
        let codec_factory = self.settings.codec_factory.as_ref();
        let pipeline: Arc<dyn SamplePipeline> = match kind {
            PipelineKind::TranscodeAudio => Arc::new(AudioTranscodePipeline::new(
                params,
                &self.settings.audio_processors,
                codec_factory,
            )?),
            PipelineKind::TranscodeVideo => {
                let job = self.job.clone();
                let on_error: ErrorReporter = Arc::new(move |error| job.fail(error));
                Arc::new(VideoTranscodePipeline::new(
                    params,
                    &self.settings.video_effects,
                    codec_factory,
                    on_error,
                )?)
            }
            PipelineKind::Passthrough => Arc::new(PassthroughPipeline::new(params)?),
        };
        Ok(pipeline)
    }
}

impl AssetLoaderListener for TrackRouter {
    fn on_duration_ms(&self, duration_ms: Option<i64>) {
        if !self.job.is_active() {
            return;
        }
        let _span = self.job.span.enter();
        let state = self.progress.on_duration(duration_ms);
        tracing::debug!(duration_ms = ?duration_ms, state = ?state, "Duration reported");
    }

    fn on_track_registered(&self) {
        if !self.job.is_active() {
            return;
        }
        self.track_registered.store(true, Ordering::Release);
        self.muxer.register_track();
        self.fallback.register_track();
    }

    fn on_all_tracks_registered(&self) {
        if !self.job.is_active() {
            return;
        }
        if !self.track_registered.load(Ordering::Acquire) {
            self.job.fail(TransformationError::NoTracks);
        }
    }

    fn on_track_added(
        &self,
        format: &Format,
        stream_start_position_us: i64,
        stream_offset_us: i64,
    ) -> Result<Arc<dyn SamplePipeline>> {
        if !self.job.is_active() {
            return Err(TransformationError::Released);
        }
        let _span = self.job.span.enter();

        let classification = classify(
            format,
            &self.settings.request,
            self.muxer.as_ref(),
            &self.options,
            stream_start_position_us,
            stream_offset_us,
        );
        tracing::debug!(
            track_type = ?format.track_type(),
            mime = ?format.mime(),
            kind = ?classification.kind,
            reason = ?classification.reason,
            "Track classified"
        );

        let params = PipelineParams {
            input_format: format.clone(),
            stream_start_position_us,
            stream_offset_us,
            request: self.settings.request.clone(),
            muxer: self.muxer.clone(),
            fallback: self.fallback.clone(),
        };
        let pipeline = self.create_pipeline(classification.kind, params)?;
        self.registry.register(pipeline.clone());
        Ok(pipeline)
    }

    fn on_error(&self, error: BoxError) {
        self.job.fail(TransformationError::from_boxed(error));
    }

    fn on_ended(&self) {
        self.job.complete();
    }
}
