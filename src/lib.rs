//! # framesift
//!
//! Resilient interval frame extraction from video files, producing
//! JPEG-compressed stills suitable for downstream multimodal-LLM
//! consumption, with bounded peak memory on arbitrarily long sources.
//!
//! `framesift` samples a video at regular timestamps, powered by FFmpeg
//! via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//! The pipeline is built to survive the messy reality of seeking through
//! real-world files: decoders that error or silently stall on certain
//! seeks are torn down and rebuilt with bounded retries, isolated bad
//! frames are skipped rather than aborting the run, and sustained failure
//! aborts cleanly.
//!
//! ## Quick start
//!
//! ```no_run
//! use framesift::{ExtractOptions, extract_frames};
//!
//! let frames = extract_frames("input.mp4", ExtractOptions::new())?;
//! for frame in &frames {
//!     println!("{:?}: {} preview bytes, blob: {}",
//!         frame.timestamp,
//!         frame.preview.len(),
//!         frame.blob.is_some());
//! }
//! # Ok::<(), framesift::ExtractError>(())
//! ```
//!
//! ## How it works
//!
//! - **[`FrameSampler`]** computes one target timestamp per
//!   `frame_interval` and drives the loop.
//! - **[`ResilientSeeker`]** performs each seek with up to
//!   [`MAX_SEEK_RETRIES`] attempts, fully reinitialising the
//!   [`DecodeSession`] between attempts.
//! - Captures accumulate in a **[`BatchFlowController`]** buffer; every
//!   [`DEFAULT_FLUSH_INTERVAL`] captures (and at end-of-stream) the batch
//!   is handed to the **[`EncodeWorker`]** thread, which composites each
//!   picture with a visible frame-index label and compresses it to JPEG.
//!   The buffer is cleared on handoff, so memory stays flat no matter how
//!   long the source is.
//! - Each [`ExtractedFrame`] carries an immediate low-quality preview
//!   (base64 data URI) and, once its batch has flushed, the full-quality
//!   labeled blob.
//!
//! Progress and per-frame callbacks plus a [`CancellationToken`] make
//! long runs observable and stoppable; see [`ExtractOptions`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod batch;
mod conversion;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod options;
pub mod progress;
pub mod sampler;
pub mod seeker;
pub mod session;

pub use batch::BatchFlowController;
pub use encoder::{EncodeWorker, LABEL_STRIP_HEIGHT};
pub use error::ExtractError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{CapturedPicture, ExtractedFrame};
pub use metadata::SourceMetadata;
pub use options::{
    DEFAULT_FLUSH_INTERVAL, DEFAULT_FRAME_INTERVAL, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH,
    DEFAULT_QUALITY, ExtractOptions,
};
pub use progress::{CancellationToken, ExtractionProgress, FrameCallback, ProgressCallback};
pub use sampler::{FrameSampler, MAX_CONSECUTIVE_FAILURES, extract_frames};
pub use seeker::{MAX_SEEK_RETRIES, ResilientSeeker};
pub use session::{DecodeBackend, DecodeSession, SEEK_TIMEOUT};
