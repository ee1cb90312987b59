//! Even-interval frame sampling.
//!
//! [`FrameSampler`] divides a video's duration into `total_frames` equal
//! slots and captures the frame at the start of each slot. Sampling is a
//! step function: every call to [`FrameSampler::step`] seeks, renders, and
//! captures exactly one frame, so the driving loop regains control between
//! frames.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use clip2gif::FrameSampler;
//!
//! let sampler = FrameSampler::new(Duration::from_secs(10), 50)?;
//! assert_eq!(sampler.display_duration(), Duration::from_millis(200));
//!
//! let offsets: Vec<f64> = sampler
//!     .requests()
//!     .map(|request| request.target_offset.as_secs_f64())
//!     .collect();
//! assert_eq!(offsets.len(), 50);
//! assert!((offsets[49] - 9.8).abs() < 1e-6);
//! # Ok::<(), clip2gif::ConversionError>(())
//! ```

use std::time::Duration;

use crate::error::ConversionError;
use crate::progress::sampling_progress;
use crate::source::VideoSource;
use crate::surface::{CapturedFrame, DrawingSurface};

/// Where and in which order one frame is sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRequest {
    /// Offset from the start of the video.
    pub target_offset: Duration,
    /// Position in the output, `0..total_frames`.
    pub sequence_index: u32,
}

/// Result of one sampling step.
#[derive(Debug)]
pub enum SampleStep {
    /// A frame was captured.
    Captured {
        /// The captured frame.
        frame: CapturedFrame,
        /// Sampling progress on the 0–50 scale.
        progress: u8,
    },
    /// Every requested frame has been captured.
    Complete,
}

/// Walks a video timeline in equal increments, one frame per step.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    total_frames: u32,
    increment_seconds: f64,
    next_index: u32,
}

impl FrameSampler {
    /// Plan `total_frames` samples across `duration`.
    ///
    /// Any positive frame count is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::InvalidFrameCount`] when `total_frames` is
    /// zero.
    pub fn new(duration: Duration, total_frames: u32) -> Result<Self, ConversionError> {
        if total_frames == 0 {
            return Err(ConversionError::InvalidFrameCount(total_frames));
        }

        Ok(Self {
            total_frames,
            increment_seconds: duration.as_secs_f64() / total_frames as f64,
            next_index: 0,
        })
    }

    /// Number of frames this sampler produces.
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Number of frames captured so far.
    pub fn captured(&self) -> u32 {
        self.next_index
    }

    /// Time between consecutive samples.
    pub fn time_increment(&self) -> Duration {
        Duration::from_secs_f64(self.increment_seconds)
    }

    /// How long each captured frame is shown in the output. Equal to the
    /// time increment.
    pub fn display_duration(&self) -> Duration {
        self.time_increment()
    }

    /// The full request plan, independent of capture state.
    pub fn requests(&self) -> impl Iterator<Item = FrameRequest> + '_ {
        (0..self.total_frames).map(|index| self.request(index))
    }

    /// The next request to capture, or `None` once all have been captured.
    pub fn peek(&self) -> Option<FrameRequest> {
        (self.next_index < self.total_frames).then(|| self.request(self.next_index))
    }

    /// Capture the next frame from `source` through `surface`.
    ///
    /// Returns [`SampleStep::Complete`] once every frame has been captured;
    /// further calls keep returning it.
    pub fn step<S: VideoSource>(
        &mut self,
        source: &mut S,
        surface: &mut DrawingSurface,
    ) -> Result<SampleStep, ConversionError> {
        let Some(request) = self.peek() else {
            return Ok(SampleStep::Complete);
        };

        source.seek(request.target_offset)?;
        source.render_into(surface)?;
        let frame = surface.capture(request, self.display_duration());

        self.next_index += 1;
        let progress = sampling_progress(self.next_index, self.total_frames);
        log::debug!(
            "Captured frame {}/{} at {:?}",
            self.next_index,
            self.total_frames,
            request.target_offset,
        );

        Ok(SampleStep::Captured { frame, progress })
    }

    fn request(&self, index: u32) -> FrameRequest {
        FrameRequest {
            target_offset: Duration::from_secs_f64(index as f64 * self.increment_seconds),
            sequence_index: index,
        }
    }
}
