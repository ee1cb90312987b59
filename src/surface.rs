//! Scratch drawing surface and captured frames.
//!
//! A [`DrawingSurface`] is the single RGBA canvas a conversion renders every
//! sampled instant onto. It is acquired once per conversion, sized to the
//! video's native resolution, and reused for every capture. Each capture is
//! copied out of it as a [`CapturedFrame`].

use std::time::Duration;

use image::RgbaImage;

use crate::error::ConversionError;
use crate::sampler::FrameRequest;

/// Largest surface area, in pixels, that can be acquired.
///
/// Matches the common 16384 × 16384 canvas ceiling.
pub const MAX_SURFACE_AREA: u64 = 16_384 * 16_384;

/// Bytes per RGBA pixel.
const BYTES_PER_PIXEL: usize = 4;

/// An RGBA drawing surface reused across all captures of a conversion.
#[derive(Debug)]
pub struct DrawingSurface {
    canvas: RgbaImage,
}

impl DrawingSurface {
    /// Acquire a surface of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::ResourceUnavailable`] when either dimension
    /// is zero or the area exceeds [`MAX_SURFACE_AREA`].
    pub fn acquire(width: u32, height: u32) -> Result<Self, ConversionError> {
        let area = width as u64 * height as u64;
        if area == 0 || area > MAX_SURFACE_AREA {
            log::warn!("Cannot acquire a {width}x{height} drawing surface");
            return Err(ConversionError::ResourceUnavailable { width, height });
        }

        Ok(Self {
            canvas: RgbaImage::new(width, height),
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Overwrite the whole surface with tightly-packed RGBA pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::VideoDecodeError`] if `pixels` does not
    /// cover the surface exactly.
    pub fn draw_rgba(&mut self, pixels: &[u8]) -> Result<(), ConversionError> {
        let target = self.canvas.as_mut();
        if pixels.len() != target.len() {
            return Err(ConversionError::VideoDecodeError(format!(
                "frame buffer holds {} bytes, surface needs {}",
                pixels.len(),
                target.len(),
            )));
        }
        target.copy_from_slice(pixels);
        Ok(())
    }

    /// Fill every pixel with one colour.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for chunk in self.canvas.as_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&rgba);
        }
    }

    /// Mutable access to the raw RGBA bytes, row-major, no padding.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        self.canvas.as_mut()
    }

    /// Copy the current surface contents into a [`CapturedFrame`].
    pub fn capture(&self, request: FrameRequest, display_duration: Duration) -> CapturedFrame {
        CapturedFrame {
            request,
            image: self.canvas.clone(),
            display_duration,
        }
    }
}

/// One sampled still frame, ready for the encoder.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// The request this frame answers.
    pub request: FrameRequest,
    /// RGBA pixels at the video's native resolution.
    pub image: RgbaImage,
    /// How long the frame stays on screen in the output.
    pub display_duration: Duration,
}

impl CapturedFrame {
    /// Display duration in GIF delay units (hundredths of a second), rounded
    /// to the nearest unit and saturated at `u16::MAX`.
    pub fn delay_centiseconds(&self) -> u16 {
        let centiseconds = (self.display_duration.as_secs_f64() * 100.0).round();
        centiseconds.min(u16::MAX as f64) as u16
    }
}
