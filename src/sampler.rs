//! The frame sampling orchestrator.
//!
//! [`FrameSampler`] drives the extraction loop: it computes the timestamp
//! schedule from the source duration and the configured interval, seeks
//! through a [`ResilientSeeker`], absorbs isolated seek failures as
//! skipped frames, escalates sustained failure to a fatal abort, and hands
//! every capture to the [`BatchFlowController`] for batched offload
//! encoding.
//!
//! A sampler runs exactly once: [`extract`](FrameSampler::extract)
//! consumes it. Construct a fresh sampler to extract again.
//!
//! # Example
//!
//! ```no_run
//! use framesift::{ExtractOptions, FrameSampler};
//!
//! let sampler = FrameSampler::open("input.mp4", ExtractOptions::new())?;
//! let frames = sampler.extract()?;
//! println!("Extracted {} frames", frames.len());
//! # Ok::<(), framesift::ExtractError>(())
//! ```

use std::{path::Path, time::Duration};

use crate::{
    batch::BatchFlowController,
    encoder::EncodeWorker,
    error::ExtractError,
    frame::{self, ExtractedFrame},
    metadata::SourceMetadata,
    options::ExtractOptions,
    progress::ExtractionProgress,
    seeker::ResilientSeeker,
    session::{DecodeBackend, DecodeSession},
};

/// How many seeks may fail in a row before the whole run aborts.
///
/// An isolated bad frame is a transient decoder glitch and is skipped;
/// this many in a row means the source itself is unusable.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// One-shot extraction orchestrator.
///
/// Generic over the decode backend; production code opens a
/// [`DecodeSession`] via [`open`](FrameSampler::open), tests inject
/// scripted backends via [`with_backend`](FrameSampler::with_backend).
pub struct FrameSampler<B: DecodeBackend = DecodeSession> {
    seeker: ResilientSeeker<B>,
    options: ExtractOptions,
}

impl<B: DecodeBackend> std::fmt::Debug for FrameSampler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSampler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl FrameSampler<DecodeSession> {
    /// Open a source file and prepare a sampler for it.
    ///
    /// Emits status-only progress events for the setup phases.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::SourceLoad`],
    /// [`ExtractError::NoVideoStream`], or
    /// [`ExtractError::DecodeSurfaceUnavailable`] if the decode pipeline
    /// cannot be built.
    pub fn open<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<Self, ExtractError> {
        options
            .progress
            .on_progress(&ExtractionProgress::status("Loading source", Duration::ZERO));

        let session = DecodeSession::open(path, options.max_width, options.max_height)?;

        options.progress.on_progress(&ExtractionProgress::status(
            "Source loaded",
            session.metadata().duration,
        ));

        Ok(Self::with_backend(session, options))
    }
}

impl<B: DecodeBackend> FrameSampler<B> {
    /// Build a sampler over an arbitrary decode backend.
    pub fn with_backend(backend: B, options: ExtractOptions) -> Self {
        Self {
            seeker: ResilientSeeker::new(backend),
            options,
        }
    }

    /// Metadata of the opened source.
    pub fn metadata(&self) -> &SourceMetadata {
        self.seeker.metadata()
    }

    /// Run the extraction to completion.
    ///
    /// Returns the ordered frames, every one carrying its preview and,
    /// after its batch flushed, its compressed blob. Consumes the sampler;
    /// the run is one pass and not restartable.
    ///
    /// All resources (decode session, batch buffer, encode worker) are
    /// released on every exit path, including errors and cancellation.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::InvalidInterval`] for a zero frame interval.
    /// - [`ExtractError::ConsecutiveFailureLimit`] after
    ///   [`MAX_CONSECUTIVE_FAILURES`] seek failures in a row. Frames
    ///   delivered through the per-frame callback before the abort remain
    ///   valid; no partial result is returned here.
    /// - [`ExtractError::Encode`] if the offload worker fails a batch.
    /// - [`ExtractError::Cancelled`] if the cancellation token fires;
    ///   pending, not-yet-encoded pictures are discarded.
    pub fn extract(mut self) -> Result<Vec<ExtractedFrame>, ExtractError> {
        if self.options.frame_interval.is_zero() {
            return Err(ExtractError::InvalidInterval);
        }

        let total_duration = self.seeker.metadata().duration;
        let interval_seconds = self.options.frame_interval.as_secs_f64();
        let total_frames = (total_duration.as_secs_f64() / interval_seconds).floor() as u64;

        let worker = EncodeWorker::spawn(self.options.quality)?;
        let mut controller = BatchFlowController::new(worker, self.options.flush_interval);

        self.options.progress.on_progress(&ExtractionProgress::status(
            "Starting extraction",
            total_duration,
        ));
        log::info!(
            "Extracting {total_frames} frames at {:?} intervals from a {:?} source",
            self.options.frame_interval,
            total_duration,
        );

        let mut consecutive_failures = 0u32;

        for index in 0..total_frames {
            if self.options.is_cancelled() {
                // Pending pictures are dropped with the controller, never
                // force-flushed.
                log::info!("Extraction cancelled before frame {index}");
                return Err(ExtractError::Cancelled);
            }

            // Strictly increasing and, by construction of total_frames,
            // always below the source duration.
            let timestamp = Duration::from_secs_f64(interval_seconds * index as f64);

            let capture = match self.seeker.seek(timestamp) {
                Ok(picture) if picture.width() > 0 && picture.height() > 0 => Some(picture),
                Ok(_) => {
                    log::warn!("Frame {index} at {timestamp:?}: decoder returned a blank picture");
                    None
                }
                Err(error) => {
                    log::warn!("Frame {index} at {timestamp:?} skipped: {error}");
                    None
                }
            };

            let Some(picture) = capture else {
                consecutive_failures += 1;
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    return Err(ExtractError::ConsecutiveFailureLimit {
                        timestamp,
                        limit: MAX_CONSECUTIVE_FAILURES,
                    });
                }
                continue;
            };
            consecutive_failures = 0;

            let preview = frame::encode_preview(&picture)?;
            let frame = ExtractedFrame {
                timestamp,
                preview,
                blob: None,
            };
            self.options.on_frame.on_frame(&frame);

            // Ownership of the picture moves into the controller here.
            controller.on_capture(picture, frame)?;

            self.options.progress.on_progress(&ExtractionProgress {
                frames_extracted: controller.frames_extracted(),
                current_time: timestamp,
                total_duration,
                progress: ((index + 1) as f32 / total_frames as f32) * 100.0,
                status: None,
            });
        }

        let frames = controller.finish()?;

        self.options.progress.on_progress(&ExtractionProgress {
            frames_extracted: frames.len() as u64,
            current_time: total_duration,
            total_duration,
            progress: 100.0,
            status: Some("Extraction complete".to_string()),
        });

        Ok(frames)
    }
}

/// Convenience wrapper: open `path` and extract in one call.
///
/// # Errors
///
/// See [`FrameSampler::open`] and [`FrameSampler::extract`].
pub fn extract_frames<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Vec<ExtractedFrame>, ExtractError> {
    FrameSampler::open(path, options)?.extract()
}
