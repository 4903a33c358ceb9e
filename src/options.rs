//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that threads output settings, progress
//! and per-frame callbacks, and cancellation tokens through the pipeline
//! without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use framesift::{CancellationToken, ExtractOptions};
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_quality(80)
//!     .with_max_dimensions(768, 768)
//!     .with_frame_interval(Duration::from_secs(2))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::progress::{CancellationToken, FrameCallback, NoOpFrame, NoOpProgress, ProgressCallback};

/// Default JPEG quality for the encode worker's output blobs.
pub const DEFAULT_QUALITY: u8 = 90;

/// Default bound on output frame width, in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 1024;

/// Default bound on output frame height, in pixels.
pub const DEFAULT_MAX_HEIGHT: u32 = 1024;

/// Default sampling interval between extracted frames.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of captures per encode batch.
///
/// The batch buffer never grows past this; it is the memory ceiling of
/// the pipeline regardless of source length.
pub const DEFAULT_FLUSH_INTERVAL: usize = 120;

/// Configuration for an extraction run.
///
/// All fields have defaults; a default-constructed value extracts one
/// frame per second at quality 90, bounded to 1024x1024, with no
/// callbacks and no cancellation.
#[derive(Clone)]
pub struct ExtractOptions {
    /// JPEG quality (1-100) for output blobs.
    pub(crate) quality: u8,
    /// Output width bound.
    pub(crate) max_width: u32,
    /// Output height bound.
    pub(crate) max_height: u32,
    /// Seconds between sampled frames.
    pub(crate) frame_interval: Duration,
    /// Captures per encode batch.
    pub(crate) flush_interval: usize,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Per-frame callback. Defaults to a no-op.
    pub(crate) on_frame: Arc<dyn FrameCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("quality", &self.quality)
            .field("max_width", &self.max_width)
            .field("max_height", &self.max_height)
            .field("frame_interval", &self.frame_interval)
            .field("flush_interval", &self.flush_interval)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            progress: Arc::new(NoOpProgress),
            on_frame: Arc::new(NoOpFrame),
            cancellation: None,
        }
    }

    /// Set the JPEG quality for output blobs. Clamped to 1-100.
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Bound the output resolution.
    ///
    /// Frames larger than `max_width` x `max_height` are downscaled to fit,
    /// preserving aspect ratio. Smaller frames keep their native size.
    /// Each bound is clamped to a minimum of 1.
    #[must_use]
    pub fn with_max_dimensions(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width.max(1);
        self.max_height = max_height.max(1);
        self
    }

    /// Set the time interval between sampled frames.
    ///
    /// A zero interval is rejected at extraction time with
    /// [`ExtractError::InvalidInterval`](crate::ExtractError::InvalidInterval).
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set how many captures accumulate before a batch is flushed to the
    /// encode worker. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_flush_interval(mut self, interval: usize) -> Self {
        self.flush_interval = interval.max(1);
        self
    }

    /// Attach a progress callback.
    ///
    /// Invoked after every captured frame and during setup phases.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a per-frame callback.
    ///
    /// Invoked once per successfully captured frame, with the frame's
    /// preview-only state.
    #[must_use]
    pub fn with_frame_callback(mut self, callback: Arc<dyn FrameCallback>) -> Self {
        self.on_frame = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the sampling loop stops between
    /// iterations and returns
    /// [`ExtractError::Cancelled`](crate::ExtractError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Resolve output dimensions: downscale to fit within the bounds,
/// preserving aspect ratio; never upscale.
pub(crate) fn bounded_dimensions(
    source_width: u32,
    source_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    if source_width <= max_width && source_height <= max_height {
        return (source_width, source_height);
    }
    let width_ratio = max_width as f64 / source_width as f64;
    let height_ratio = max_height as f64 / source_height as f64;
    let ratio = width_ratio.min(height_ratio);
    let width = ((source_width as f64 * ratio).round() as u32).max(1);
    let height = ((source_height as f64 * ratio).round() as u32).max(1);
    (width, height)
}
