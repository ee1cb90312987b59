//! Source video metadata.
//!
//! [`VideoMetadata`] is read once when a source is opened and is all the
//! pipeline needs to plan sampling and size the encoder.

use std::time::Duration;

/// Metadata for the video stream being converted.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use clip2gif::VideoMetadata;
///
/// let metadata = VideoMetadata::new(640, 360, Duration::from_secs(10));
/// assert_eq!(metadata.pixel_count(), 640 * 360);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Native frame width in pixels.
    pub width: u32,
    /// Native frame height in pixels.
    pub height: u32,
    /// Total duration of the video.
    pub duration: Duration,
    /// Frames per second (may be approximate for variable-frame-rate content,
    /// `0.0` when unknown).
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`), `"unknown"` when unavailable.
    pub codec: String,
}

impl VideoMetadata {
    /// Metadata with only the fields sampling depends on.
    pub fn new(width: u32, height: u32, duration: Duration) -> Self {
        Self {
            width,
            height,
            duration,
            frames_per_second: 0.0,
            codec: "unknown".to_string(),
        }
    }

    /// Number of pixels in one native-resolution frame.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
