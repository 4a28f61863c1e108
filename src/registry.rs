//! Registry of the sample pipelines of the running job

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::pipeline::SamplePipeline;

type PipelineList = Vec<Arc<dyn SamplePipeline>>;

/// Active pipelines, read by progress polling and written by the job.
///
/// Writers publish a new list; readers load the current snapshot without
/// locking, and positions come from each pipeline's atomic counter.
pub struct PipelineRegistry {
    pipelines: ArcSwap<PipelineList>,
}

impl Default for PipelineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self {
            pipelines: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn register(&self, pipeline: Arc<dyn SamplePipeline>) {
        self.pipelines.rcu(|current| {
            let mut next = PipelineList::clone(current);
            next.push(pipeline.clone());
            next
        });
    }

    pub fn len(&self) -> usize {
        self.pipelines.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.load().is_empty()
    }

    pub fn clear(&self) {
        self.pipelines.store(Arc::new(Vec::new()));
    }

    /// Release every pipeline, then forget them
    pub fn release_all(&self) {
        let pipelines = self.pipelines.swap(Arc::new(Vec::new()));
        for pipeline in pipelines.iter() {
            pipeline.release();
        }
    }

    /// Mean position of all pipelines in milliseconds, 0 when empty
    pub fn aggregate_position_ms(&self) -> i64 {
        let pipelines = self.pipelines.load();
        if pipelines.is_empty() {
            return 0;
        }
        let sum: i64 = pipelines.iter().map(|p| p.current_position_ms()).sum();
        sum / pipelines.len() as i64
    }
}
