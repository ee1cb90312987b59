//! Conversion configuration.
//!
//! [`ConversionOptions`] is a builder that carries the frame count, encoder
//! tuning, cancellation handle, and blob store into a conversion without
//! widening every function signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use clip2gif::{CancelHandle, ConversionOptions, ObjectStore};
//!
//! let cancel = CancelHandle::new();
//! let store = Arc::new(ObjectStore::new());
//! let options = ConversionOptions::new()
//!     .with_total_frames(30)
//!     .with_quality(5)
//!     .with_cancellation(cancel.clone())
//!     .with_object_store(Arc::clone(&store));
//! assert_eq!(options.total_frames(), 30);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::blob::ObjectStore;
use crate::encoder::{DEFAULT_QUALITY, DEFAULT_WORKERS, EncoderSettings};
use crate::metadata::VideoMetadata;
use crate::progress::CancelHandle;

/// Frame count used when none is configured.
pub const DEFAULT_TOTAL_FRAMES: u32 = 50;

/// Frame counts a UI should offer. The pipeline itself accepts any positive
/// count.
pub const FRAME_COUNT_RANGE: RangeInclusive<u32> = 10..=100;

/// Settings for one conversion.
#[derive(Clone)]
pub struct ConversionOptions {
    pub(crate) total_frames: u32,
    pub(crate) workers: usize,
    pub(crate) quality: u8,
    pub(crate) repeat: Option<u16>,
    pub(crate) cancellation: Option<CancelHandle>,
    pub(crate) store: Arc<ObjectStore>,
}

impl Debug for ConversionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConversionOptions")
            .field("total_frames", &self.total_frames)
            .field("workers", &self.workers)
            .field("quality", &self.quality)
            .field("repeat", &self.repeat)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("stored_blobs", &self.store.len())
            .finish()
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionOptions {
    /// Defaults: 50 frames, 2 workers, quality 10, infinite loop, a private
    /// blob store.
    pub fn new() -> Self {
        Self {
            total_frames: DEFAULT_TOTAL_FRAMES,
            workers: DEFAULT_WORKERS,
            quality: DEFAULT_QUALITY,
            repeat: None,
            cancellation: None,
            store: Arc::new(ObjectStore::new()),
        }
    }

    /// Set how many frames are sampled. Not clamped; zero is rejected when
    /// the conversion starts.
    #[must_use]
    pub fn with_total_frames(mut self, total_frames: u32) -> Self {
        self.total_frames = total_frames;
        self
    }

    /// Set the number of encoder worker threads (minimum 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the encoder quality, 1 (best) to 30 (fastest).
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the repeat count. `None` loops forever.
    #[must_use]
    pub fn with_repeat(mut self, repeat: Option<u16>) -> Self {
        self.repeat = repeat;
        self
    }

    /// Use an existing cancel handle instead of a fresh one, so the caller
    /// can cancel before the conversion object exists.
    #[must_use]
    pub fn with_cancellation(mut self, handle: CancelHandle) -> Self {
        self.cancellation = Some(handle);
        self
    }

    /// Register finished GIFs in `store`.
    #[must_use]
    pub fn with_object_store(mut self, store: Arc<ObjectStore>) -> Self {
        self.store = store;
        self
    }

    /// Configured frame count.
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// The store finished GIFs are registered in.
    pub fn object_store(&self) -> &Arc<ObjectStore> {
        &self.store
    }

    /// Encoder settings for a source with `metadata`.
    pub(crate) fn encoder_settings(&self, metadata: &VideoMetadata) -> EncoderSettings {
        EncoderSettings {
            workers: self.workers,
            quality: self.quality,
            width: metadata.width,
            height: metadata.height,
            repeat: self.repeat,
        }
    }
}

/// Clamp a requested frame count into [`FRAME_COUNT_RANGE`].
pub fn clamp_frame_count(requested: u32) -> u32 {
    requested.clamp(*FRAME_COUNT_RANGE.start(), *FRAME_COUNT_RANGE.end())
}
