//! Error types for the `framesift` crate.
//!
//! This module defines [`ExtractError`], the unified error type returned by
//! all fallible operations in the crate. Variants distinguish transient,
//! per-frame problems (a single exhausted seek) from fatal conditions that
//! abort the whole run (sustained failure, setup failure, cancellation).

use std::{path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framesift` operations.
///
/// Every public method that can fail returns `Result<T, ExtractError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The source video could not be loaded or its metadata is unusable.
    ///
    /// Covers open failures, unknown or zero duration, and zero native
    /// dimensions. Always fatal, raised before any frame work begins.
    #[error("Failed to load source at {path}: {reason}")]
    SourceLoad {
        /// Path that was passed to the sampler.
        path: PathBuf,
        /// Underlying reason the load failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A seek exhausted its retry budget.
    ///
    /// Absorbed by the sampler as a skipped frame unless it is part of a
    /// run of consecutive failures.
    #[error("Seek to {timestamp:?} failed after {attempts} attempts: {reason}")]
    Seek {
        /// The target timestamp that could not be reached.
        timestamp: Duration,
        /// How many attempts were made before giving up.
        attempts: u32,
        /// The last underlying error.
        reason: String,
    },

    /// Too many seeks failed in a row; the source is likely structurally
    /// unusable (corrupt region, unsupported variable frame rate, etc.).
    #[error("Aborting extraction: {limit} consecutive seek failures, last at {timestamp:?}")]
    ConsecutiveFailureLimit {
        /// The timestamp whose failure tripped the limit.
        timestamp: Duration,
        /// The configured consecutive-failure limit.
        limit: u32,
    },

    /// A decode or scaling surface could not be created at setup time.
    #[error("Decode surface unavailable: {0}")]
    DecodeSurfaceUnavailable(String),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    Decode(String),

    /// The offload worker failed to compress a batch.
    #[error("Failed to encode frame batch: {0}")]
    Encode(String),

    /// A frame interval of zero was provided.
    #[error("Frame interval must be greater than zero")]
    InvalidInterval,

    /// The operation was cancelled via a
    /// [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error from the `image` crate during preview or blob encoding.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

impl From<FfmpegError> for ExtractError {
    fn from(error: FfmpegError) -> Self {
        ExtractError::Ffmpeg(error.to_string())
    }
}
