//! The source-video seam.
//!
//! [`VideoSource`] is what the sampler needs from a decoded video: its
//! metadata, the ability to seek, and the ability to draw the frame visible
//! at the current position. [`MediaFile`](crate::MediaFile) implements it on
//! top of FFmpeg; tests implement it with synthetic frames.

use std::time::Duration;

use crate::error::ConversionError;
use crate::metadata::VideoMetadata;
use crate::surface::DrawingSurface;

/// A decoded video the sampler can walk.
pub trait VideoSource {
    /// Metadata read when the source was opened.
    fn metadata(&self) -> &VideoMetadata;

    /// Move the playhead to `offset` from the start of the video.
    ///
    /// Offsets past the end clamp to the last frame.
    fn seek(&mut self, offset: Duration) -> Result<(), ConversionError>;

    /// Wait for the last seek to settle and draw the visible frame onto
    /// `surface`, scaled to the surface size.
    fn render_into(&mut self, surface: &mut DrawingSurface) -> Result<(), ConversionError>;

    /// Release the source. Called exactly once when the conversion ends,
    /// whichever way it ends.
    fn release(self)
    where
        Self: Sized,
    {
    }
}
