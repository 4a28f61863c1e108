//! Media transformer core
//!
//! Routes each track of a media transformation job to a passthrough or
//! transcoding sample pipeline and aggregates per-track positions into job
//! progress, delivering exactly one completion or error per job.

pub mod classifier;
pub mod codec;
pub mod config;
pub mod config_file;
pub mod error;
pub mod fallback;
pub mod format;
pub mod loader;
pub mod mime;
pub mod muxer;
pub mod pipeline;
pub mod plan;
pub mod progress;
pub mod registry;
pub mod request;
pub mod transformer;

#[cfg(test)]
pub(crate) mod tests;

pub use classifier::{classify, Classification, PipelineKind, ProcessingOptions, TranscodeReason};
pub use config::TransformerConfig;
pub use error::{BoxError, ErrorCode, PlaybackError, PlaybackErrorCode, Result, TransformationError};
pub use fallback::{FallbackListener, FallbackTracker};
pub use format::{Format, Sample};
pub use loader::{AssetLoader, AssetLoaderListener};
pub use mime::TrackType;
pub use muxer::{ContainerCapabilities, Muxer, SinkCapabilities};
pub use pipeline::SamplePipeline;
pub use progress::{ProgressSnapshot, ProgressState};
pub use request::{ClippingConfiguration, MediaItem, TransformationRequest};
pub use transformer::{ProgressHandle, Transformer, TransformerListener, TransformerSettings};
