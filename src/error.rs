//! Error types for the `clip2gif` crate.
//!
//! This module defines [`ConversionError`], the unified error type returned
//! by all fallible operations and handed to
//! [`ConversionObserver::on_error`](crate::ConversionObserver::on_error).
//! The `Display` text of each variant is the human-readable message a UI
//! shows to the user.

use std::path::PathBuf;

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `clip2gif` operations.
///
/// The first five variants are the conversion failure kinds a caller is
/// expected to distinguish. The remaining variants come from the media
/// backend while opening or decoding the source.
///
/// The type is [`Clone`] so the same error can be delivered to an observer
/// and forwarded through channels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConversionError {
    /// The runtime lacks a primitive the pipeline needs (media decoding or
    /// worker threads).
    #[error("Your system does not support the required features for GIF conversion.")]
    EnvironmentUnsupported {
        /// What exactly was missing. Logged, not shown.
        reason: String,
    },

    /// The supplied file does not declare a `video/*` media type.
    #[error("Please select a video file.")]
    InvalidInput {
        /// The media type the input declared.
        media_type: String,
    },

    /// The scratch drawing surface could not be acquired.
    #[error("Drawing surface is not available.")]
    ResourceUnavailable {
        /// Requested surface width.
        width: u32,
        /// Requested surface height.
        height: u32,
    },

    /// The conversion was cancelled before it produced output.
    #[error("GIF conversion aborted.")]
    Aborted,

    /// The encoder reported a failure.
    #[error("Error during conversion: {0}")]
    EncoderError(String),

    /// A frame count of zero was requested.
    #[error("Frame count must be a positive integer (got {0})")]
    InvalidFrameCount(u32),

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path of the input.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

impl ConversionError {
    /// Returns `true` for the cancellation outcome, which a UI usually
    /// presents differently from a crash.
    pub fn is_aborted(&self) -> bool {
        matches!(self, ConversionError::Aborted)
    }
}

impl From<FfmpegError> for ConversionError {
    fn from(error: FfmpegError) -> Self {
        ConversionError::FfmpegError(error.to_string())
    }
}
