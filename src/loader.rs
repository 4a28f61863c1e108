//! Asset loader interface
//!
//! The loader reads the input, discovers tracks and pushes their samples.
//! All listener calls for a job are expected on one coordination thread;
//! only `on_track_added` returns a value, the pipeline to feed.

use std::sync::Arc;

use crate::error::{BoxError, Result};
use crate::format::Format;
use crate::pipeline::SamplePipeline;
use crate::request::MediaItem;

pub trait AssetLoader: Send {
    /// Start loading `media_item`, reporting to `listener`
    fn start(&mut self, media_item: &MediaItem, listener: Arc<dyn AssetLoaderListener>);

    /// Stop loading and free resources. Does not wait for in-flight work.
    fn release(&mut self);
}

/// Events sent by the loader during a job
pub trait AssetLoaderListener: Send + Sync {
    /// Duration of the input; `None` or non-positive if unknown
    fn on_duration_ms(&self, duration_ms: Option<i64>);

    /// One track was accepted for output
    fn on_track_registered(&self);

    /// Track discovery is complete
    fn on_all_tracks_registered(&self);

    /// A track's format is known; returns the pipeline its samples go to
    fn on_track_added(
        &self,
        format: &Format,
        stream_start_position_us: i64,
        stream_offset_us: i64,
    ) -> Result<Arc<dyn SamplePipeline>>;

    fn on_error(&self, error: BoxError);

    /// Every track reached end of stream
    fn on_ended(&self);
}
