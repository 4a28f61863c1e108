//! Job progress state
//!
//! State and duration are stored in atomics so a poller on any thread can
//! read them while the job's coordination thread updates them.

use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};

use serde::Serialize;

/// Coarse progress phase of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProgressState {
    /// No job running
    NoTransformation = 0,
    /// Job started, duration not reported yet
    WaitingForAvailability = 1,
    /// Duration known, a percentage can be computed
    Available = 2,
    /// Duration unknown; stays this way until the job ends
    Unavailable = 3,
}

impl ProgressState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ProgressState::WaitingForAvailability,
            2 => ProgressState::Available,
            3 => ProgressState::Unavailable,
            _ => ProgressState::NoTransformation,
        }
    }
}

/// Result of a progress query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub state: ProgressState,
    /// Only set when `state` is `Available`; never above 99
    pub percent: Option<u8>,
}

/// Highest percentage reported from position math; 100 only comes from
/// the completion event.
pub const MAX_PROGRESS_PERCENT: i64 = 99;

#[derive(Debug)]
pub struct JobProgress {
    state: AtomicU8,
    duration_ms: AtomicI64,
}

impl Default for JobProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl JobProgress {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ProgressState::NoTransformation as u8),
            duration_ms: AtomicI64::new(0),
        }
    }

    pub fn state(&self) -> ProgressState {
        ProgressState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn duration_ms(&self) -> Option<i64> {
        match self.state() {
            ProgressState::Available => Some(self.duration_ms.load(Ordering::Acquire)),
            _ => None,
        }
    }

    /// A job started: forget the old duration and wait for a new one
    pub fn start(&self) {
        self.duration_ms.store(0, Ordering::Release);
        self.state
            .store(ProgressState::WaitingForAvailability as u8, Ordering::Release);
    }

    /// Back to idle
    pub fn reset(&self) {
        self.state
            .store(ProgressState::NoTransformation as u8, Ordering::Release);
        self.duration_ms.store(0, Ordering::Release);
    }

    /// Record a duration reported by the loader.
    ///
    /// An unknown or non-positive duration makes progress unavailable for
    /// the rest of the job, even if a usable duration arrives later.
    pub fn on_duration(&self, duration_ms: Option<i64>) -> ProgressState {
        let usable = duration_ms.filter(|d| *d > 0);
        if let Some(duration) = usable {
            // Publish the duration before a state that makes it readable.
            if matches!(
                self.state(),
                ProgressState::WaitingForAvailability | ProgressState::Available
            ) {
                self.duration_ms.store(duration, Ordering::Release);
            }
        }
        let next = match usable {
            Some(_) => ProgressState::Available,
            None => ProgressState::Unavailable,
        };
        let result = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                match ProgressState::from_u8(current) {
                    ProgressState::Unavailable | ProgressState::NoTransformation => None,
                    _ => Some(next as u8),
                }
            });
        match result {
            Ok(_) => next,
            Err(current) => ProgressState::from_u8(current),
        }
    }

    /// Progress for the given mean position of all tracks
    pub fn snapshot(&self, position_ms: i64) -> ProgressSnapshot {
        let state = self.state();
        let percent = match state {
            ProgressState::Available => {
                let duration = self.duration_ms.load(Ordering::Acquire);
                (duration > 0).then(|| {
                    let raw = position_ms.max(0).saturating_mul(100) / duration;
                    raw.min(MAX_PROGRESS_PERCENT) as u8
                })
            }
            _ => None,
        };
        ProgressSnapshot { state, percent }
    }
}
