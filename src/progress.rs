//! Progress reporting, per-frame notification, and cancellation.
//!
//! This module provides [`ProgressCallback`] and [`FrameCallback`] for
//! observing an extraction run, [`CancellationToken`] for cooperative
//! cancellation, and [`ExtractionProgress`] for progress snapshots.
//!
//! Callbacks are one-way notifications: the pipeline never depends on their
//! side effects for its own correctness, and they cannot halt the run. Use
//! a [`CancellationToken`] to stop an extraction early.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesift::{ExtractOptions, ExtractionProgress, ProgressCallback};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, progress: &ExtractionProgress) {
//!         println!("{:.1}% ({} frames)", progress.progress, progress.frames_extracted);
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use crate::frame::ExtractedFrame;

/// A snapshot of extraction progress.
///
/// Emitted after every successfully captured frame, and during pipeline
/// setup phases as status-only events with zero frames.
#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    /// How many frames have been captured so far.
    pub frames_extracted: u64,
    /// The timestamp most recently processed.
    pub current_time: Duration,
    /// Total duration of the source.
    pub total_duration: Duration,
    /// Completion percentage (0.0 - 100.0).
    pub progress: f32,
    /// Human-readable status, set during setup phases.
    pub status: Option<String>,
}

impl ExtractionProgress {
    /// Build a status-only snapshot for a setup phase (zero frames).
    pub(crate) fn status(status: impl Into<String>, total_duration: Duration) -> Self {
        Self {
            frames_extracted: 0,
            current_time: Duration::ZERO,
            total_duration,
            progress: 0.0,
            status: Some(status.into()),
        }
    }
}

/// Trait for receiving progress updates during extraction.
///
/// Implementations must be [`Send`] and [`Sync`]; the pipeline may invoke
/// callbacks from worker threads in future revisions. Callbacks are
/// infallible and cannot halt the operation.
pub trait ProgressCallback: Send + Sync {
    /// Called after every captured frame and during setup phases.
    fn on_progress(&self, progress: &ExtractionProgress);
}

/// Trait for receiving each frame as soon as it is captured.
///
/// The frame carries its preview only; the compressed blob is not yet
/// populated at notification time. This is the sole channel through which
/// callers can observe partial results if the run later aborts.
pub trait FrameCallback: Send + Sync {
    /// Called once per successfully captured frame.
    fn on_frame(&self, frame: &ExtractedFrame);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _progress: &ExtractionProgress) {}
}

pub(crate) struct NoOpFrame;

impl FrameCallback for NoOpFrame {
    fn on_frame(&self, _frame: &ExtractedFrame) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation. The sampling loop checks
/// [`is_cancelled`](CancellationToken::is_cancelled) between iterations,
/// stops emitting further frames, and proceeds directly to cleanup.
/// Already-captured, not-yet-encoded pictures are discarded.
///
/// # Example
///
/// ```
/// use framesift::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
