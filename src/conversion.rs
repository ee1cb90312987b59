//! The conversion pipeline.
//!
//! A [`Conversion`] ties a [`FrameSampler`] to a [`FrameEncoder`] and walks
//! through the states of [`ConversionState`]:
//!
//! ```text
//! Idle --decode--> Sampling --all frames--> Encoding --terminal event--> Finalized
//!   \________________\__________________________\_____error / abort____/
//! ```
//!
//! Every call to [`Conversion::tick`] does one unit of work: decode the
//! input, capture one frame, or collect encoder events. The source and the
//! encoder only exist while sampling or encoding, and every exit goes
//! through one teardown path that releases them before the observer hears
//! the outcome.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::blob::ObjectUrl;
use crate::config::ConversionOptions;
use crate::encoder::{EncoderEvent, EncoderSettings, FrameEncoder};
use crate::error::ConversionError;
use crate::input::VideoInput;
use crate::media::FfmpegBackend;
use crate::metadata::VideoMetadata;
use crate::progress::{
    CancelHandle, ConversionObserver, ConversionPhase, ProgressTracker, encoding_progress,
};
use crate::sampler::{FrameSampler, SampleStep};
use crate::scheduler::{FrameClock, IntervalClock};
use crate::source::VideoSource;
use crate::surface::DrawingSurface;

/// Opens sources and creates encoders for a conversion.
pub trait MediaBackend {
    /// The decoded video type.
    type Source: VideoSource;
    /// The encoder type.
    type Encoder: FrameEncoder;

    /// Verify the runtime can decode media and run encoder workers.
    fn check_environment(&self) -> Result<(), ConversionError>;

    /// Open and decode `input`.
    fn open_source(&mut self, input: &VideoInput) -> Result<Self::Source, ConversionError>;

    /// Create an encoder with `settings`.
    fn create_encoder(&mut self, settings: EncoderSettings)
    -> Result<Self::Encoder, ConversionError>;
}

/// Where a conversion is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    /// Waiting for the input to be decoded.
    Idle,
    /// Capturing frames.
    Sampling,
    /// Waiting for the encoder to finish.
    Encoding,
    /// A terminal outcome has been delivered.
    Finalized,
}

/// What a driving loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// More work remains; tick again.
    Pending,
    /// The conversion has finished.
    Finished,
}

/// Per-conversion resources, alive from decode to teardown.
struct Job<S, E> {
    source: S,
    encoder: E,
    surface: DrawingSurface,
    sampler: FrameSampler,
    abort_requested: bool,
}

impl<S: VideoSource, E> Job<S, E> {
    fn release(self) {
        let Job {
            source, encoder, ..
        } = self;
        drop(encoder);
        source.release();
    }
}

enum Stage<S, E> {
    Idle,
    Sampling(Job<S, E>),
    Encoding(Job<S, E>),
    Finalized,
}

/// One video-to-GIF conversion.
///
/// Created by [`start_conversion`] or [`convert_video_to_gif`]. Drive it
/// with [`run`](Conversion::run), or call [`tick`](Conversion::tick) from
/// your own loop.
pub struct Conversion<B: MediaBackend> {
    backend: B,
    input: VideoInput,
    options: ConversionOptions,
    stage: Stage<B::Source, B::Encoder>,
    tracker: ProgressTracker,
    cancel: CancelHandle,
    outcome: Option<Result<ObjectUrl, ConversionError>>,
}

impl<B: MediaBackend> Debug for Conversion<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Conversion")
            .field("input", &self.input)
            .field("options", &self.options)
            .field("state", &self.state())
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// Start converting `input` with `backend`.
///
/// The environment, the input's media type, and the frame count are checked
/// before anything else happens. If a check fails, `observer.on_error` is
/// called before this function returns, no progress is ever reported, and
/// the returned conversion is already [`Finalized`](ConversionState::Finalized).
pub fn start_conversion<B: MediaBackend>(
    backend: B,
    input: VideoInput,
    options: ConversionOptions,
    observer: Arc<dyn ConversionObserver>,
) -> Conversion<B> {
    let cancel = options.cancellation.clone().unwrap_or_default();
    let mut conversion = Conversion {
        backend,
        input,
        options,
        stage: Stage::Idle,
        tracker: ProgressTracker::new(observer),
        cancel,
        outcome: None,
    };

    if let Err(error) = conversion.check_preconditions() {
        log::warn!(
            "Rejected {} before starting: {error:?}",
            conversion.input.path().display()
        );
        conversion.finish(Err(error));
    } else {
        log::info!(
            "Converting {} ({} frames)",
            conversion.input.path().display(),
            conversion.options.total_frames,
        );
    }

    conversion
}

/// Start converting `input` with FFmpeg decoding and the parallel GIF
/// encoder.
pub fn convert_video_to_gif(
    input: VideoInput,
    options: ConversionOptions,
    observer: Arc<dyn ConversionObserver>,
) -> Conversion<FfmpegBackend> {
    start_conversion(FfmpegBackend::new(), input, options, observer)
}

impl<B: MediaBackend> Conversion<B> {
    /// Current lifecycle state.
    pub fn state(&self) -> ConversionState {
        match self.stage {
            Stage::Idle => ConversionState::Idle,
            Stage::Sampling(_) => ConversionState::Sampling,
            Stage::Encoding(_) => ConversionState::Encoding,
            Stage::Finalized => ConversionState::Finalized,
        }
    }

    /// Returns `true` once a terminal outcome has been delivered.
    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finalized)
    }

    /// A handle that requests cancellation of this conversion.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The input being converted.
    pub fn input(&self) -> &VideoInput {
        &self.input
    }

    /// The terminal outcome, once finished.
    pub fn outcome(&self) -> Option<&Result<ObjectUrl, ConversionError>> {
        self.outcome.as_ref()
    }

    /// Number of frames captured so far.
    pub fn frames_captured(&self) -> u32 {
        match &self.stage {
            Stage::Sampling(job) | Stage::Encoding(job) => job.sampler.captured(),
            Stage::Idle | Stage::Finalized => 0,
        }
    }

    /// Do one unit of work.
    pub fn tick(&mut self) -> Tick {
        if self.is_finished() {
            return Tick::Finished;
        }

        if self.cancel.is_cancelled() {
            self.request_abort();
        }

        let step = match self.stage {
            Stage::Idle => self.load(),
            Stage::Sampling(_) => self.sample(),
            Stage::Encoding(_) | Stage::Finalized => Ok(()),
        };
        if let Err(error) = step {
            self.finish(Err(error));
        }

        self.drain_encoder_events();

        if self.is_finished() {
            Tick::Finished
        } else {
            Tick::Pending
        }
    }

    /// Drive the conversion to completion at display refresh rate.
    pub fn run(&mut self) -> Result<ObjectUrl, ConversionError> {
        self.run_with_clock(&mut IntervalClock::animation_frame())
    }

    /// Drive the conversion to completion, pacing ticks with `clock`.
    pub fn run_with_clock<C: FrameClock + ?Sized>(
        &mut self,
        clock: &mut C,
    ) -> Result<ObjectUrl, ConversionError> {
        while self.tick() == Tick::Pending {
            clock.wait_next_frame();
        }
        match &self.outcome {
            Some(outcome) => outcome.clone(),
            None => Err(ConversionError::Aborted),
        }
    }

    fn check_preconditions(&self) -> Result<(), ConversionError> {
        self.backend.check_environment()?;

        if !self.input.is_video() {
            return Err(ConversionError::InvalidInput {
                media_type: self.input.media_type().to_string(),
            });
        }

        if self.options.total_frames == 0 {
            return Err(ConversionError::InvalidFrameCount(0));
        }

        Ok(())
    }

    fn request_abort(&mut self) {
        if matches!(self.stage, Stage::Idle) {
            log::info!("Cancelled before decoding started");
            self.finish(Err(ConversionError::Aborted));
            return;
        }

        if let Stage::Sampling(job) | Stage::Encoding(job) = &mut self.stage {
            if !job.abort_requested {
                log::info!("Cancellation requested; aborting encoder");
                job.abort_requested = true;
                job.encoder.abort();
            }
        }
    }

    /// Decode the input and set up the job.
    fn load(&mut self) -> Result<(), ConversionError> {
        let source = self.backend.open_source(&self.input)?;
        let metadata = source.metadata().clone();

        match self.prepare(&metadata) {
            Ok((encoder, surface, sampler)) => {
                log::debug!(
                    "Sampling {} frames every {:?} from a {}x{} source",
                    sampler.total_frames(),
                    sampler.time_increment(),
                    metadata.width,
                    metadata.height,
                );
                self.stage = Stage::Sampling(Job {
                    source,
                    encoder,
                    surface,
                    sampler,
                    abort_requested: false,
                });
                Ok(())
            }
            Err(error) => {
                source.release();
                Err(error)
            }
        }
    }

    fn prepare(
        &mut self,
        metadata: &VideoMetadata,
    ) -> Result<(B::Encoder, DrawingSurface, FrameSampler), ConversionError> {
        let sampler = FrameSampler::new(metadata.duration, self.options.total_frames)?;
        let surface = DrawingSurface::acquire(metadata.width, metadata.height)?;
        let encoder = self
            .backend
            .create_encoder(self.options.encoder_settings(metadata))?;
        Ok((encoder, surface, sampler))
    }

    /// Capture one frame, or hand off to the encoder when sampling is done.
    fn sample(&mut self) -> Result<(), ConversionError> {
        let Stage::Sampling(job) = &mut self.stage else {
            return Ok(());
        };
        if job.abort_requested {
            return Ok(());
        }

        match job.sampler.step(&mut job.source, &mut job.surface)? {
            SampleStep::Captured { frame, progress } => {
                job.encoder.add_frame(frame)?;
                self.tracker.report(ConversionPhase::Sampling, progress);
            }
            SampleStep::Complete => {
                log::debug!("Sampling complete; rendering");
                job.encoder.render();
                self.stage = match std::mem::replace(&mut self.stage, Stage::Finalized) {
                    Stage::Sampling(job) => Stage::Encoding(job),
                    other => other,
                };
            }
        }

        Ok(())
    }

    fn drain_encoder_events(&mut self) {
        loop {
            let (event, abort_requested) = match &mut self.stage {
                Stage::Sampling(job) | Stage::Encoding(job) => {
                    (job.encoder.poll_event(), job.abort_requested)
                }
                Stage::Idle | Stage::Finalized => return,
            };
            let Some(event) = event else {
                return;
            };

            match event {
                EncoderEvent::Progress(fraction) => {
                    if !abort_requested && matches!(self.stage, Stage::Encoding(_)) {
                        self.tracker
                            .report(ConversionPhase::Encoding, encoding_progress(fraction));
                    }
                }
                EncoderEvent::Finished(bytes) => {
                    let url = self.options.store.create_object_url(bytes);
                    self.finish(Ok(url));
                }
                EncoderEvent::Aborted => self.finish(Err(ConversionError::Aborted)),
                EncoderEvent::Error(detail) => {
                    self.finish(Err(ConversionError::EncoderError(detail)));
                }
            }
        }
    }

    /// The single teardown path: release resources, then notify.
    fn finish(&mut self, outcome: Result<ObjectUrl, ConversionError>) {
        if self.outcome.is_some() {
            return;
        }

        let stage = std::mem::replace(&mut self.stage, Stage::Finalized);
        if let Stage::Sampling(job) | Stage::Encoding(job) = stage {
            job.release();
        }

        let observer = self.tracker.observer();
        match &outcome {
            Ok(url) => {
                log::info!("Conversion finished: {url}");
                observer.on_success(url);
            }
            Err(error) => {
                log::info!("Conversion ended: {error}");
                observer.on_error(error);
            }
        }
        self.outcome = Some(outcome);
    }
}
