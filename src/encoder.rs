//! The encoder seam.
//!
//! The orchestrator treats the encoder as an asynchronous service: frames
//! go in with [`FrameEncoder::add_frame`], [`FrameEncoder::render`] starts
//! producing output, and results come back as [`EncoderEvent`]s polled once
//! per tick. [`GifEncoder`](crate::GifEncoder) is the production
//! implementation.

use crate::error::ConversionError;
use crate::surface::CapturedFrame;

/// Default number of encoder worker threads.
pub const DEFAULT_WORKERS: usize = 2;

/// Default quality. Lower is better; the valid range is 1–30.
pub const DEFAULT_QUALITY: u8 = 10;

/// Best (slowest) quality setting.
pub const MIN_QUALITY: u8 = 1;

/// Worst (fastest) quality setting.
pub const MAX_QUALITY: u8 = 30;

/// Settings for one encoder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Worker threads used while rendering. At least 1.
    pub workers: usize,
    /// Palette quantization quality, 1 (best) to 30 (fastest).
    pub quality: u8,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// How many times the animation repeats. `None` loops forever.
    pub repeat: Option<u16>,
}

impl EncoderSettings {
    /// Default settings for an output of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            quality: DEFAULT_QUALITY,
            width,
            height,
            repeat: None,
        }
    }

    /// Quality clamped into the valid range.
    pub fn clamped_quality(&self) -> u8 {
        self.quality.clamp(MIN_QUALITY, MAX_QUALITY)
    }
}

/// Something the encoder reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderEvent {
    /// Rendering progress as a fraction in `0.0..=1.0`.
    Progress(f32),
    /// Rendering finished with the encoded output.
    Finished(Vec<u8>),
    /// Rendering stopped because an abort was requested.
    Aborted,
    /// Rendering failed.
    Error(String),
}

impl EncoderEvent {
    /// Returns `true` for the events that end an encoder's life.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EncoderEvent::Progress(_))
    }
}

/// An asynchronous frame encoder.
///
/// An encoder reports at most one terminal event
/// ([`Finished`](EncoderEvent::Finished), [`Aborted`](EncoderEvent::Aborted)
/// or [`Error`](EncoderEvent::Error)) that the orchestrator acts on.
pub trait FrameEncoder {
    /// Queue a frame. Frames are encoded in the order they are added.
    fn add_frame(&mut self, frame: CapturedFrame) -> Result<(), ConversionError>;

    /// Start producing the output from the queued frames.
    fn render(&mut self);

    /// Ask the encoder to stop. The encoder confirms with
    /// [`EncoderEvent::Aborted`].
    fn abort(&mut self);

    /// The next pending event, without blocking.
    fn poll_event(&mut self) -> Option<EncoderEvent>;
}
