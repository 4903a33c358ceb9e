//! Internal pixel and timestamp conversion helpers.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed RGB
/// buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width * 3).
/// This strips the padding so the result can be handed to
/// [`image::RgbImage::from_raw`] or a [`CapturedPicture`](crate::CapturedPicture).
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        // No padding: copy the entire plane at once.
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        // Stride includes padding bytes: copy row by row.
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}
