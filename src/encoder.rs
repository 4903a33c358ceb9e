//! Out-of-band batch encoding.
//!
//! [`EncodeWorker`] runs JPEG compression on a dedicated thread so the
//! sampling loop never blocks on encoding. Batches of captured pictures go
//! in; compressed blobs come back in the same order, which is the caller's
//! correlation key (there is no per-frame identifier on the wire).
//!
//! Only plain owned buffers cross the thread boundary; no FFmpeg state is
//! ever shared with the worker. Each picture is composited onto a canvas
//! with a label strip carrying its global frame index, which makes frame
//! ordering auditable in the output images themselves.

use std::{
    sync::mpsc::{Receiver, Sender, channel},
    thread::JoinHandle,
};

use image::{ExtendedColorType, Rgb, RgbImage, codecs::jpeg::JpegEncoder, imageops};

use crate::{error::ExtractError, frame::CapturedPicture};

/// Height of the label strip appended below each picture.
pub const LABEL_STRIP_HEIGHT: u32 = 24;

/// Left margin of the index label inside the strip.
const LABEL_MARGIN: u32 = 8;

/// Pixel scale applied to the 5x7 label glyphs.
const LABEL_SCALE: u32 = 2;

/// 5x7 bitmap glyphs for the digits 0-9, one row per byte, 5 bits wide.
const DIGIT_GLYPHS: [[u8; 7]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
];

struct EncodeRequest {
    pictures: Vec<CapturedPicture>,
    starting_index: u64,
    reply: Sender<Result<Vec<Vec<u8>>, ExtractError>>,
}

/// Handle to the encode thread.
///
/// Dropping the handle (or calling [`shutdown`](EncodeWorker::shutdown))
/// closes the request channel and joins the thread. Shutdown is
/// idempotent.
pub struct EncodeWorker {
    sender: Option<Sender<EncodeRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl EncodeWorker {
    /// Spawn the encode thread.
    ///
    /// `quality` is the JPEG quality (1-100) applied to every blob this
    /// worker produces.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Encode`] if the thread cannot be spawned
    /// (setup failure, before any frame is attempted).
    pub fn spawn(quality: u8) -> Result<Self, ExtractError> {
        let (sender, receiver) = channel::<EncodeRequest>();
        let handle = std::thread::Builder::new()
            .name("framesift-encode".to_string())
            .spawn(move || worker_loop(receiver, quality))
            .map_err(|error| {
                ExtractError::Encode(format!("Failed to spawn encode worker: {error}"))
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Encode a batch of pictures, blocking until the blobs are ready.
    ///
    /// `starting_index` is the global frame index of the first picture;
    /// the i-th picture is labeled `starting_index + i`. Output order
    /// matches input order. An empty batch returns an empty result
    /// immediately without touching the worker.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Encode`] if compression fails or the worker
    /// has terminated.
    pub fn encode(
        &self,
        pictures: Vec<CapturedPicture>,
        starting_index: u64,
    ) -> Result<Vec<Vec<u8>>, ExtractError> {
        if pictures.is_empty() {
            return Ok(Vec::new());
        }

        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ExtractError::Encode("Encode worker is shut down".to_string()))?;

        let (reply, response) = channel();
        sender
            .send(EncodeRequest {
                pictures,
                starting_index,
                reply,
            })
            .map_err(|_| ExtractError::Encode("Encode worker is no longer running".to_string()))?;

        response
            .recv()
            .map_err(|_| ExtractError::Encode("Encode worker terminated mid-batch".to_string()))?
    }

    /// Stop the worker and wait for it to exit. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        // Closing the channel ends the worker loop.
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EncodeWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: Receiver<EncodeRequest>, quality: u8) {
    while let Ok(request) = receiver.recv() {
        let result = encode_batch(request.pictures, request.starting_index, quality);
        // The requester may have unwound already; nothing to do then.
        let _ = request.reply.send(result);
    }
}

fn encode_batch(
    pictures: Vec<CapturedPicture>,
    starting_index: u64,
    quality: u8,
) -> Result<Vec<Vec<u8>>, ExtractError> {
    let mut blobs = Vec::with_capacity(pictures.len());
    for (local_index, picture) in pictures.into_iter().enumerate() {
        let index = starting_index + local_index as u64;
        blobs.push(encode_labeled(picture, index, quality)?);
    }
    Ok(blobs)
}

/// Composite one picture onto a labeled canvas and compress it.
///
/// Consumes the picture; its backing memory is released as soon as the
/// pixels have been copied onto the canvas.
fn encode_labeled(
    picture: CapturedPicture,
    index: u64,
    quality: u8,
) -> Result<Vec<u8>, ExtractError> {
    let width = picture.width();
    let height = picture.height();

    let source = picture.into_rgb_image()?;
    let mut canvas = RgbImage::from_pixel(width, height + LABEL_STRIP_HEIGHT, Rgb([18, 18, 18]));
    imageops::replace(&mut canvas, &source, 0, 0);
    drop(source);

    let label_y = height + (LABEL_STRIP_HEIGHT - 7 * LABEL_SCALE) / 2;
    stamp_number(&mut canvas, LABEL_MARGIN, label_y, index);

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder.encode(
        canvas.as_raw(),
        width,
        height + LABEL_STRIP_HEIGHT,
        ExtendedColorType::Rgb8,
    )?;
    Ok(jpeg)
}

/// Stamp a decimal number onto the canvas in white 5x7 glyphs.
fn stamp_number(canvas: &mut RgbImage, x: u32, y: u32, value: u64) {
    let mut pen_x = x;
    for ch in value.to_string().chars() {
        let glyph = &DIGIT_GLYPHS[(ch as u8 - b'0') as usize];
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (0b10000 >> col) == 0 {
                    continue;
                }
                for dy in 0..LABEL_SCALE {
                    for dx in 0..LABEL_SCALE {
                        let px = pen_x + col * LABEL_SCALE + dx;
                        let py = y + row as u32 * LABEL_SCALE + dy;
                        if px < canvas.width() && py < canvas.height() {
                            canvas.put_pixel(px, py, Rgb([255, 255, 255]));
                        }
                    }
                }
            }
        }
        pen_x += 6 * LABEL_SCALE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_draws_expected_glyph_pixels() {
        let mut canvas = RgbImage::from_pixel(64, 32, Rgb([0, 0, 0]));
        stamp_number(&mut canvas, 0, 0, 1);

        // Top row of "1" is 0b00100: only column 2 is set.
        assert_eq!(canvas.get_pixel(2 * LABEL_SCALE, 0), &Rgb([255, 255, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn stamp_handles_multi_digit_values() {
        let mut canvas = RgbImage::from_pixel(128, 32, Rgb([0, 0, 0]));
        stamp_number(&mut canvas, 0, 0, 120);

        // Second digit starts one advance (6 * scale) to the right; "2"
        // has its top-left at column 1.
        let advance = 6 * LABEL_SCALE;
        assert_eq!(
            canvas.get_pixel(advance + LABEL_SCALE, 0),
            &Rgb([255, 255, 255])
        );
    }

    #[test]
    fn stamp_clips_at_canvas_edge() {
        let mut canvas = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        // Must not panic even though the glyph exceeds the canvas.
        stamp_number(&mut canvas, 0, 0, 888);
    }
}
