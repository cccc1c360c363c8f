//! Progress accounting for a pipeline run.
//!
//! The state machine is a pure reducer, [`reduce`], folding
//! [`ProgressEvent`]s into a [`ProgressState`] snapshot. [`ProgressTracker`]
//! owns the current snapshot for one run and pushes every new snapshot to a
//! [`ProgressObserver`].
//!
//! Inject an [`Arc<dyn ProgressObserver>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! snapshots. Observers are read-only: the pipeline is the only writer.
//!
//! # Example
//!
//! ```rust
//! use edgequake_causelist::{AnalysisConfig, ProgressObserver, ProgressState};
//! use std::sync::Arc;
//!
//! struct PrintObserver;
//!
//! impl ProgressObserver for PrintObserver {
//!     fn on_progress(&self, state: &ProgressState) {
//!         eprintln!("{:?} {}/{}", state.stage, state.current, state.total);
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(PrintObserver))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Idle,
    Extracting,
    Analyzing,
    Complete,
    Error,
}

impl Stage {
    /// `Complete` and `Error` end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }
}

/// Snapshot delivered to observers after every update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub stage: Stage,
    pub current: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressState {
    /// `0/0` in the `Idle` stage.
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Everything that can move a run's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A run begins; any previous state is discarded and the stage is `Idle`.
    RunStarted,
    /// The document is open and page extraction begins.
    ExtractionStarted,
    /// The extractor reported page `current` of `total`.
    ExtractionProgress { current: usize, total: usize },
    /// Extraction finished with `total_pages` pages; classification begins.
    AnalysisStarted { total_pages: usize },
    /// A chunk finished; `pages_processed` pages are classified so far.
    ChunkCompleted { pages_processed: usize },
    RunFinished,
    RunFailed { message: String },
}

/// Pure transition function.
///
/// Within the `Analyzing` stage `current` never decreases and never exceeds
/// `total`. `RunFinished` pins `current` to `total`.
pub fn reduce(previous: &ProgressState, event: &ProgressEvent) -> ProgressState {
    match event {
        ProgressEvent::RunStarted => ProgressState::idle(),
        ProgressEvent::ExtractionStarted => ProgressState {
            stage: Stage::Extracting,
            current: 0,
            total: 0,
            message: None,
        },
        ProgressEvent::ExtractionProgress { current, total } => ProgressState {
            stage: Stage::Extracting,
            current: (*current).min(*total),
            total: *total,
            message: None,
        },
        ProgressEvent::AnalysisStarted { total_pages } => ProgressState {
            stage: Stage::Analyzing,
            current: 0,
            total: *total_pages,
            message: None,
        },
        ProgressEvent::ChunkCompleted { pages_processed } => {
            let capped = (*pages_processed).min(previous.total);
            ProgressState {
                stage: previous.stage,
                current: capped.max(previous.current),
                total: previous.total,
                message: previous.message.clone(),
            }
        }
        ProgressEvent::RunFinished => ProgressState {
            stage: Stage::Complete,
            current: previous.total,
            total: previous.total,
            message: None,
        },
        ProgressEvent::RunFailed { message } => ProgressState {
            stage: Stage::Error,
            current: previous.current,
            total: previous.total,
            message: Some(message.clone()),
        },
    }
}

/// Receives a snapshot after every progress update.
///
/// Implementations must be `Send + Sync`; the observer is shared through an
/// `Arc` and may be handed to other tasks by the caller.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, state: &ProgressState);
}

/// A no-op observer for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressObserver;

impl ProgressObserver for NoopProgressObserver {
    fn on_progress(&self, _state: &ProgressState) {}
}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn ProgressObserver>;

/// Holds one run's progress state and notifies the observer on each change.
///
/// Created fresh for every run, so nothing carries over from a failed run.
pub struct ProgressTracker {
    state: ProgressState,
    observer: ProgressCallback,
}

impl ProgressTracker {
    pub fn new(observer: ProgressCallback) -> Self {
        Self {
            state: ProgressState::idle(),
            observer,
        }
    }

    pub fn apply(&mut self, event: ProgressEvent) {
        self.state = reduce(&self.state, &event);
        self.observer.on_progress(&self.state);
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }
}
