//! Captured pictures and extracted frames.
//!
//! [`CapturedPicture`] is the in-flight representation of a decoded frame:
//! an owned, tightly-packed RGB8 raster tagged with its source timestamp.
//! Ownership of a picture moves at every pipeline boundary (sampler to
//! batch controller to encode worker), so a picture can never be observed
//! after it has been handed off.
//!
//! [`ExtractedFrame`] is the durable output unit. Its `preview` is produced
//! synchronously at capture time; its `blob` is filled in once the owning
//! batch has been flushed through the encode worker. Consumers must
//! tolerate `blob == None` on a frame whose batch has not flushed yet.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use image::{ExtendedColorType, RgbImage, codecs::jpeg::JpegEncoder};

use crate::error::ExtractError;

/// JPEG quality for the immediate low-fidelity preview.
///
/// Deliberately low: the preview exists for UI responsiveness, the
/// offload worker produces the real blob later at the configured quality.
const PREVIEW_QUALITY: u8 = 35;

/// A decoded frame captured into an owned RGB8 buffer.
///
/// Produced by a decode backend via copy-on-capture: the backend's working
/// surface is copied, never aliased, so the picture stays valid after the
/// decoder seeks elsewhere or is torn down.
#[derive(Debug, Clone)]
pub struct CapturedPicture {
    width: u32,
    height: u32,
    timestamp: Duration,
    data: Vec<u8>,
}

impl CapturedPicture {
    /// Create a picture from a tightly-packed RGB8 buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Decode`] if `data` is not exactly
    /// `width * height * 3` bytes.
    pub fn new(
        width: u32,
        height: u32,
        timestamp: Duration,
        data: Vec<u8>,
    ) -> Result<Self, ExtractError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(ExtractError::Decode(format!(
                "Picture buffer is {} bytes, expected {expected} for {width}x{height} RGB8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            timestamp,
            data,
        })
    }

    /// Picture width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Picture height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The target timestamp this picture was captured at.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Borrow the raw RGB8 pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the picture into an [`RgbImage`].
    ///
    /// Used by the encode worker; consuming enforces the destructive
    /// handoff (the picture cannot be read again after this).
    pub(crate) fn into_rgb_image(self) -> Result<RgbImage, ExtractError> {
        let (width, height) = (self.width, self.height);
        RgbImage::from_raw(width, height, self.data).ok_or_else(|| {
            ExtractError::Encode(format!(
                "Failed to construct {width}x{height} image from captured picture"
            ))
        })
    }
}

/// One extracted frame: the durable output unit of the pipeline.
#[derive(Debug, Clone)]
pub struct ExtractedFrame {
    /// Source timestamp of the frame.
    pub timestamp: Duration,
    /// Inline-displayable low-quality JPEG, as a base64 data URI.
    /// Available immediately at capture time.
    pub preview: String,
    /// The full-quality labeled JPEG. `None` until the frame's batch has
    /// been flushed through the encode worker.
    pub blob: Option<Vec<u8>>,
}

/// Encode the immediate low-fidelity preview for a captured picture.
///
/// Returns a `data:image/jpeg;base64,...` URI suitable for inline display.
pub(crate) fn encode_preview(picture: &CapturedPicture) -> Result<String, ExtractError> {
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, PREVIEW_QUALITY);
    encoder.encode(
        picture.data(),
        picture.width(),
        picture.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(format!(
        "data:image/jpeg;base64,{}",
        general_purpose::STANDARD.encode(jpeg)
    ))
}
