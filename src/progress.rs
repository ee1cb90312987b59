//! Progress reporting, observers, and cancellation.
//!
//! A conversion reports one integer percentage built from two phases:
//! sampling fills 0–50 and encoding fills 50–100. The weighting is fixed and
//! does not depend on video length or frame count.
//!
//! Callers receive progress and the terminal outcome through a
//! [`ConversionObserver`], either implemented directly or assembled from
//! closures with [`ConversionCallbacks`]. A [`CancelHandle`] requests that
//! a running conversion abort.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use clip2gif::{ConversionCallbacks, ConversionOptions, VideoInput};
//!
//! let callbacks = ConversionCallbacks::new(
//!     |url| println!("done: {url}"),
//!     |error| eprintln!("{error}"),
//! )
//! .with_progress(|info| println!("{}%", info.percentage));
//!
//! let input = VideoInput::open("clip.mp4");
//! let mut conversion =
//!     clip2gif::convert_video_to_gif(input, ConversionOptions::new(), Arc::new(callbacks));
//! conversion.run();
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::blob::ObjectUrl;
use crate::error::ConversionError;

/// Share of the overall percentage given to sampling.
const SAMPLING_WEIGHT: f64 = 50.0;

/// Share of the overall percentage given to encoding.
const ENCODING_WEIGHT: f64 = 50.0;

/// Sampling progress after `captured` of `total` frames, on the 0–50 scale.
///
/// Computed as `round(captured / total * 50)`.
pub fn sampling_progress(captured: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    ((captured as f64 / total as f64) * SAMPLING_WEIGHT).round() as u8
}

/// Overall progress for an encoder fraction in `0.0..=1.0`, on the 50–100
/// scale.
///
/// Computed as `50 + round(fraction * 50)`. Out-of-range fractions are
/// clamped.
pub fn encoding_progress(fraction: f32) -> u8 {
    let fraction = (fraction as f64).clamp(0.0, 1.0);
    (SAMPLING_WEIGHT + (fraction * ENCODING_WEIGHT).round()) as u8
}

/// The phase a progress report comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConversionPhase {
    /// Seeking and capturing frames from the source.
    Sampling,
    /// The encoder is building the output.
    Encoding,
}

/// A snapshot of conversion progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Which phase produced this report.
    pub phase: ConversionPhase,
    /// Overall completion, 0–100.
    pub percentage: u8,
    /// Wall-clock time since the conversion started.
    pub elapsed: Duration,
    /// Estimated time remaining, extrapolated from the current percentage.
    pub estimated_remaining: Option<Duration>,
}

/// Receives progress and the single terminal outcome of a conversion.
///
/// Exactly one of [`on_success`](ConversionObserver::on_success) and
/// [`on_error`](ConversionObserver::on_error) is called per conversion.
/// Implementations must be [`Send`] and [`Sync`] so a conversion can run on
/// a background thread.
pub trait ConversionObserver: Send + Sync {
    /// Called each time the overall percentage is recomputed.
    fn on_progress(&self, _info: &ProgressInfo) {}

    /// Called once with the URL of the finished GIF.
    fn on_success(&self, url: &ObjectUrl);

    /// Called once when the conversion fails or is aborted.
    fn on_error(&self, error: &ConversionError);
}

type SuccessFn = Box<dyn Fn(&ObjectUrl) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&ConversionError) + Send + Sync>;
type ProgressFn = Box<dyn Fn(&ProgressInfo) + Send + Sync>;

/// A [`ConversionObserver`] built from closures.
///
/// The progress closure is optional.
pub struct ConversionCallbacks {
    on_success: SuccessFn,
    on_error: ErrorFn,
    on_progress: Option<ProgressFn>,
}

impl ConversionCallbacks {
    /// Callbacks for the two terminal outcomes.
    pub fn new<S, E>(on_success: S, on_error: E) -> Self
    where
        S: Fn(&ObjectUrl) + Send + Sync + 'static,
        E: Fn(&ConversionError) + Send + Sync + 'static,
    {
        Self {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
            on_progress: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress<P>(mut self, on_progress: P) -> Self
    where
        P: Fn(&ProgressInfo) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(on_progress));
        self
    }
}

impl Debug for ConversionCallbacks {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConversionCallbacks")
            .field("has_progress", &self.on_progress.is_some())
            .finish_non_exhaustive()
    }
}

impl ConversionObserver for ConversionCallbacks {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(info);
        }
    }

    fn on_success(&self, url: &ObjectUrl) {
        (self.on_success)(url);
    }

    fn on_error(&self, error: &ConversionError) {
        (self.on_error)(error);
    }
}

/// Requests cancellation of a running conversion.
///
/// Cancelling only asks; the conversion observes the request on its next
/// tick, aborts the encoder, and reports [`ConversionError::Aborted`] once
/// the encoder confirms. Calling [`cancel`](CancelHandle::cancel) more than
/// once has the same effect as calling it once, and calling it after the
/// conversion has finished does nothing.
///
/// Clones share state, and the handle may be used from any thread.
///
/// # Example
///
/// ```
/// use clip2gif::CancelHandle;
///
/// let handle = CancelHandle::new();
/// assert!(!handle.is_cancelled());
///
/// handle.clone().cancel();
/// assert!(handle.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a new, non-cancelled handle.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks timing and turns percentages into [`ProgressInfo`] callbacks.
pub(crate) struct ProgressTracker {
    observer: Arc<dyn ConversionObserver>,
    start_time: Instant,
    last_percentage: Option<u8>,
}

impl ProgressTracker {
    pub(crate) fn new(observer: Arc<dyn ConversionObserver>) -> Self {
        Self {
            observer,
            start_time: Instant::now(),
            last_percentage: None,
        }
    }

    /// Report a percentage for `phase`.
    pub(crate) fn report(&mut self, phase: ConversionPhase, percentage: u8) {
        let percentage = percentage.min(100);
        if self.last_percentage.is_some_and(|last| percentage < last) {
            log::warn!("Progress went backwards: {:?} -> {percentage}", self.last_percentage);
        }
        self.last_percentage = Some(percentage);

        let elapsed = self.start_time.elapsed();
        let estimated_remaining = (percentage > 0).then(|| {
            let per_point = elapsed / percentage as u32;
            per_point * (100 - percentage) as u32
        });

        let info = ProgressInfo {
            phase,
            percentage,
            elapsed,
            estimated_remaining,
        };
        self.observer.on_progress(&info);
    }

    pub(crate) fn observer(&self) -> &Arc<dyn ConversionObserver> {
        &self.observer
    }
}
