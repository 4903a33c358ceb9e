//! Decode sessions and the decode backend seam.
//!
//! A [`DecodeSession`] owns one FFmpeg demuxer, video decoder, and scaler
//! bound to a source file. It supports nearest-keyframe seeking with a
//! decode-forward phase, and captures the decoded picture into an owned
//! buffer (copy-on-capture; the internal working surface is reused across
//! seeks and never aliased by callers).
//!
//! The [`DecodeBackend`] trait is the seam between the retry machinery and
//! the concrete decoder. Production code uses `DecodeSession`; tests drive
//! the pipeline with scripted backends.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::AV_TIME_BASE;

use crate::{
    conversion,
    error::ExtractError,
    frame::CapturedPicture,
    metadata::SourceMetadata,
    options::bounded_dimensions,
};

/// Wall-clock budget for a single seek attempt, covering the seek call and
/// the decode-forward phase. Exceeding it fails the attempt; the resilient
/// seeker decides whether to retry.
pub const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// Abstraction over a seekable, capturable decode resource.
///
/// The implementor is an owned resource slot: [`reinitialize`] may replace
/// the entire internal state, so callers must not retain handles to
/// anything a previous incarnation produced (captured pictures are owned
/// copies and remain valid).
///
/// [`reinitialize`]: DecodeBackend::reinitialize
pub trait DecodeBackend {
    /// Cached metadata for the opened source.
    fn metadata(&self) -> &SourceMetadata;

    /// Seek to `timestamp` and capture the decoded picture there.
    ///
    /// A failure leaves the backend in an unspecified (possibly stuck)
    /// state; callers recover by calling
    /// [`reinitialize`](DecodeBackend::reinitialize).
    fn seek_capture(&mut self, timestamp: Duration) -> Result<CapturedPicture, ExtractError>;

    /// Tear down and rebuild the decode resource from scratch.
    fn reinitialize(&mut self) -> Result<(), ExtractError>;
}

/// A live decode session: demuxer + decoder + scaler for one source file.
///
/// Single-owner, never shared across extraction runs. Replaced wholesale
/// by [`reinitialize`](DecodeBackend::reinitialize) when a seek leaves the
/// decoder in an unrecoverable state.
pub struct DecodeSession {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ScalingContext,
    /// Raw decoder output, reused across seeks.
    decoded_frame: VideoFrame,
    /// Scaled RGB24 working surface, reused across seeks.
    rgb_frame: VideoFrame,
    metadata: SourceMetadata,
    time_base: Rational,
    video_stream_index: usize,
    output_width: u32,
    output_height: u32,
    /// Retained so the session can reopen itself on reinitialization.
    path: PathBuf,
    max_width: u32,
    max_height: u32,
}

impl DecodeSession {
    /// Open a source file and build the decode pipeline.
    ///
    /// Output resolution is the source resolution downscaled (aspect
    /// preserved) to fit within `max_width` x `max_height`.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::SourceLoad`] if the file cannot be opened, its
    ///   duration is unknown, or the video stream reports zero dimensions.
    /// - [`ExtractError::NoVideoStream`] if the file has no video.
    /// - [`ExtractError::DecodeSurfaceUnavailable`] if the scaler cannot
    ///   be created.
    pub fn open<P: AsRef<Path>>(
        path: P,
        max_width: u32,
        max_height: u32,
    ) -> Result<Self, ExtractError> {
        let path = path.as_ref().to_path_buf();

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init().map_err(|error| ExtractError::SourceLoad {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| ExtractError::SourceLoad {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        let video_stream_index = input
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index())
            .ok_or(ExtractError::NoVideoStream)?;

        let duration_microseconds = input.duration();
        if duration_microseconds <= 0 {
            return Err(ExtractError::SourceLoad {
                path,
                reason: "Container reports unknown or zero duration".to_string(),
            });
        }
        let duration = Duration::from_micros(duration_microseconds as u64);

        let format = input.format().name().to_string();

        let stream = input
            .stream(video_stream_index)
            .ok_or(ExtractError::NoVideoStream)?;
        let time_base = stream.time_base();

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                ExtractError::SourceLoad {
                    path: path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| ExtractError::SourceLoad {
                    path: path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(ExtractError::SourceLoad {
                path,
                reason: format!("Video stream reports unusable dimensions {width}x{height}"),
            });
        }

        // Average frame rate, falling back to the stream's raw rate.
        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let (output_width, output_height) =
            bounded_dimensions(width, height, max_width, max_height);

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            output_width,
            output_height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| {
            ExtractError::DecodeSurfaceUnavailable(format!(
                "Failed to create scaling context: {error}"
            ))
        })?;

        let metadata = SourceMetadata {
            duration,
            width,
            height,
            frames_per_second,
            codec,
            format,
        };

        log::debug!(
            "Opened {}: {:?}, {}x{} -> {}x{}, {:.2} fps",
            path.display(),
            metadata.duration,
            width,
            height,
            output_width,
            output_height,
            frames_per_second,
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            metadata,
            time_base,
            video_stream_index,
            output_width,
            output_height,
            path,
            max_width,
            max_height,
        })
    }

    /// Output dimensions after the aspect-preserving bound.
    pub fn output_dimensions(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }

    /// Scale the current decoded picture and copy it out.
    fn capture(&mut self, timestamp: Duration) -> Result<CapturedPicture, ExtractError> {
        // Guards against a decoder that "succeeded" into a blank state.
        if self.decoded_frame.width() == 0 || self.decoded_frame.height() == 0 {
            return Err(ExtractError::Decode(format!(
                "Decoder produced an empty picture at {timestamp:?}"
            )));
        }

        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        let buffer =
            conversion::frame_to_rgb_buffer(&self.rgb_frame, self.output_width, self.output_height);
        CapturedPicture::new(self.output_width, self.output_height, timestamp, buffer)
    }
}

impl DecodeBackend for DecodeSession {
    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    /// Nearest-keyframe seek, then decode forward to the target timestamp.
    ///
    /// The whole attempt is bounded by [`SEEK_TIMEOUT`]; a corrupt region
    /// that stalls the decode-forward loop fails the attempt instead of
    /// hanging the pipeline.
    fn seek_capture(&mut self, timestamp: Duration) -> Result<CapturedPicture, ExtractError> {
        let deadline = Instant::now() + SEEK_TIMEOUT;
        let target_seconds = timestamp.as_secs_f64();

        // Seek in AV_TIME_BASE units (stream-independent).
        let seek_target = (target_seconds * f64::from(AV_TIME_BASE)) as i64;
        self.input.seek(seek_target, ..seek_target)?;
        self.decoder.flush();

        // Accept the frame whose display period spans the target.
        let tolerance = if self.metadata.frames_per_second > 0.0 {
            0.5 / self.metadata.frames_per_second
        } else {
            0.001
        };

        let mut found = false;
        'demux: for (stream, packet) in self.input.packets() {
            if Instant::now() >= deadline {
                return Err(ExtractError::Decode(format!(
                    "Seek to {timestamp:?} timed out after {SEEK_TIMEOUT:?}"
                )));
            }
            if stream.index() != self.video_stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;
            while self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let pts = self.decoded_frame.pts().unwrap_or(0);
                let seconds = conversion::pts_to_seconds(pts, self.time_base);
                if seconds + tolerance >= target_seconds {
                    found = true;
                    break 'demux;
                }
            }
        }

        if found {
            return self.capture(timestamp);
        }

        // Flush the decoder: the target may sit in its delay queue.
        self.decoder.send_eof()?;
        while self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
            let pts = self.decoded_frame.pts().unwrap_or(0);
            let seconds = conversion::pts_to_seconds(pts, self.time_base);
            if seconds + tolerance >= target_seconds {
                found = true;
                break;
            }
        }

        if found {
            return self.capture(timestamp);
        }

        Err(ExtractError::Decode(format!(
            "Stream ended before reaching {timestamp:?}"
        )))
    }

    /// Drop the whole session and reopen the source from scratch.
    ///
    /// Recovers from decoders that get stuck in an internal state after
    /// certain seeks; only a fresh handle helps there.
    fn reinitialize(&mut self) -> Result<(), ExtractError> {
        log::debug!("Reinitialising decode session for {}", self.path.display());
        let fresh = DecodeSession::open(&self.path, self.max_width, self.max_height)?;
        *self = fresh;
        Ok(())
    }
}
