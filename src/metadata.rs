//! Source metadata.
//!
//! [`SourceMetadata`] is extracted once when a decode session opens and
//! cached for the lifetime of the extraction run. It is the read-only view
//! of the source that the sampler uses to derive its timestamp schedule.

use std::time::Duration;

/// Metadata describing the video stream of an opened source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetadata {
    /// Container-level duration.
    pub duration: Duration,
    /// Native frame width in pixels.
    pub width: u32,
    /// Native frame height in pixels.
    pub height: u32,
    /// Average frames per second, derived from the stream's frame rate.
    pub frames_per_second: f64,
    /// Video codec name (e.g. "h264"), or "unknown".
    pub codec: String,
    /// Container format name (e.g. "mov,mp4,m4a,3gp,3g2,mj2").
    pub format: String,
}
