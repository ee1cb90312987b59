//! Parallel animated GIF encoder.
//!
//! [`GifEncoder`] collects captured frames and, once rendering starts, hands
//! palette quantization to a pool of worker threads. A coordinator thread
//! gathers the quantized frames, reports progress as they complete, and
//! writes them in sequence order into an in-memory GIF.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use clip2gif::{
//!     DrawingSurface, EncoderEvent, EncoderSettings, FrameEncoder, FrameRequest, GifEncoder,
//! };
//!
//! let mut encoder = GifEncoder::new(EncoderSettings::new(64, 64))?;
//! let mut surface = DrawingSurface::acquire(64, 64)?;
//! for index in 0..4 {
//!     surface.fill([index as u8 * 60, 0, 0, 255]);
//!     let request = FrameRequest {
//!         target_offset: Duration::from_millis(index as u64 * 250),
//!         sequence_index: index,
//!     };
//!     encoder.add_frame(surface.capture(request, Duration::from_millis(250)))?;
//! }
//! encoder.render();
//!
//! loop {
//!     match encoder.poll_event() {
//!         Some(EncoderEvent::Finished(bytes)) => {
//!             std::fs::write("squares.gif", bytes)?;
//!             break;
//!         }
//!         Some(EncoderEvent::Error(detail)) => panic!("{detail}"),
//!         _ => std::thread::yield_now(),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use gif::{Encoder, Frame, Repeat};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::encoder::{EncoderEvent, EncoderSettings, FrameEncoder};
use crate::error::ConversionError;
use crate::surface::CapturedFrame;

/// Lifecycle of a [`GifEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collecting,
    Rendering,
    Done,
}

/// A GIF encoder that quantizes frames on a worker pool.
pub struct GifEncoder {
    settings: EncoderSettings,
    frames: Vec<CapturedFrame>,
    pool: Option<ThreadPool>,
    phase: Phase,
    abort_requested: bool,
    abort_flag: Arc<AtomicBool>,
    sender: Sender<EncoderEvent>,
    receiver: Receiver<EncoderEvent>,
}

impl GifEncoder {
    /// Create an encoder and start its worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::EncoderError`] if the dimensions are zero
    /// or exceed the GIF limit of 65535 pixels, or if the worker threads
    /// cannot be started.
    pub fn new(settings: EncoderSettings) -> Result<Self, ConversionError> {
        let fits = |value: u32| (1..=u16::MAX as u32).contains(&value);
        if !fits(settings.width) || !fits(settings.height) {
            return Err(ConversionError::EncoderError(format!(
                "{}x{} is outside the GIF size limits",
                settings.width, settings.height,
            )));
        }

        let workers = settings.workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("gif-worker-{index}"))
            .build()
            .map_err(|error| {
                ConversionError::EncoderError(format!(
                    "Failed to start {workers} encoder workers: {error}"
                ))
            })?;

        log::debug!(
            "GIF encoder ready ({}x{}, workers={workers}, quality={})",
            settings.width,
            settings.height,
            settings.clamped_quality(),
        );

        let (sender, receiver) = unbounded();
        Ok(Self {
            settings,
            frames: Vec::new(),
            pool: Some(pool),
            phase: Phase::Collecting,
            abort_requested: false,
            abort_flag: Arc::new(AtomicBool::new(false)),
            sender,
            receiver,
        })
    }

    /// The settings this encoder was created with.
    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Number of frames queued and not yet handed to the render thread.
    pub fn queued_frames(&self) -> usize {
        self.frames.len()
    }
}

impl FrameEncoder for GifEncoder {
    fn add_frame(&mut self, frame: CapturedFrame) -> Result<(), ConversionError> {
        if self.phase != Phase::Collecting {
            return Err(ConversionError::EncoderError(
                "Frames cannot be added once rendering has started".to_string(),
            ));
        }

        let (width, height) = frame.image.dimensions();
        if (width, height) != (self.settings.width, self.settings.height) {
            return Err(ConversionError::EncoderError(format!(
                "Frame {} is {width}x{height}, expected {}x{}",
                frame.request.sequence_index, self.settings.width, self.settings.height,
            )));
        }

        self.frames.push(frame);
        Ok(())
    }

    fn render(&mut self) {
        if self.phase != Phase::Collecting {
            return;
        }
        let Some(pool) = self.pool.take() else {
            return;
        };
        self.phase = Phase::Rendering;

        let job = RenderJob {
            frames: std::mem::take(&mut self.frames),
            settings: self.settings,
            abort: Arc::clone(&self.abort_flag),
            events: self.sender.clone(),
            pool,
        };
        log::debug!("Rendering {} frames", job.frames.len());

        let spawned = thread::Builder::new()
            .name("gif-render".to_string())
            .spawn(move || job.run());
        if let Err(error) = spawned {
            self.phase = Phase::Done;
            let _ = self.sender.send(EncoderEvent::Error(format!(
                "Failed to start render thread: {error}"
            )));
        }
    }

    fn abort(&mut self) {
        if self.abort_requested || self.phase == Phase::Done {
            return;
        }
        self.abort_requested = true;

        match self.phase {
            Phase::Collecting => {
                self.frames.clear();
                self.pool = None;
                self.phase = Phase::Done;
                let _ = self.sender.send(EncoderEvent::Aborted);
            }
            Phase::Rendering => self.abort_flag.store(true, Ordering::Release),
            Phase::Done => {}
        }
    }

    fn poll_event(&mut self) -> Option<EncoderEvent> {
        let event = self.receiver.try_recv().ok()?;
        if event.is_terminal() {
            self.phase = Phase::Done;
        }
        Some(event)
    }
}

impl Drop for GifEncoder {
    fn drop(&mut self) {
        self.abort_flag.store(true, Ordering::Release);
    }
}

/// Everything the render thread owns.
struct RenderJob {
    frames: Vec<CapturedFrame>,
    settings: EncoderSettings,
    abort: Arc<AtomicBool>,
    events: Sender<EncoderEvent>,
    pool: ThreadPool,
}

impl RenderJob {
    fn run(self) {
        let RenderJob {
            frames,
            settings,
            abort,
            events,
            pool,
        } = self;

        let event = match render_frames(frames, &settings, &abort, &events, &pool) {
            Ok(Some(bytes)) => {
                log::debug!("GIF rendered ({} bytes)", bytes.len());
                EncoderEvent::Finished(bytes)
            }
            Ok(None) => {
                log::debug!("GIF rendering aborted");
                EncoderEvent::Aborted
            }
            Err(detail) => {
                log::warn!("GIF rendering failed: {detail}");
                EncoderEvent::Error(detail)
            }
        };
        let _ = events.send(event);
    }
}

/// Quantize on the pool, then write in order. `Ok(None)` means aborted.
fn render_frames(
    frames: Vec<CapturedFrame>,
    settings: &EncoderSettings,
    abort: &Arc<AtomicBool>,
    events: &Sender<EncoderEvent>,
    pool: &ThreadPool,
) -> Result<Option<Vec<u8>>, String> {
    let total = frames.len();
    let width = settings.width as u16;
    let height = settings.height as u16;
    let speed = settings.clamped_quality() as i32;

    let (done_sender, done_receiver) = unbounded::<(usize, Option<Frame<'static>>)>();
    for (index, captured) in frames.into_iter().enumerate() {
        let done_sender = done_sender.clone();
        let abort = Arc::clone(abort);
        pool.spawn(move || {
            let quantized = (!abort.load(Ordering::Acquire))
                .then(|| quantize(captured, width, height, speed));
            let _ = done_sender.send((index, quantized));
        });
    }
    drop(done_sender);

    let mut slots: Vec<Option<Frame<'static>>> = (0..total).map(|_| None).collect();
    for completed in 1..=total {
        let (index, quantized) = done_receiver
            .recv()
            .map_err(|_| "Encoder worker exited unexpectedly".to_string())?;
        if abort.load(Ordering::Acquire) {
            return Ok(None);
        }
        let Some(frame) = quantized else {
            return Ok(None);
        };
        slots[index] = Some(frame);
        let _ = events.send(EncoderEvent::Progress(completed as f32 / total as f32));
    }

    if abort.load(Ordering::Acquire) {
        return Ok(None);
    }

    let repeat = match settings.repeat {
        None => Repeat::Infinite,
        Some(count) => Repeat::Finite(count),
    };

    let mut buffer = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buffer, width, height, &[])
            .map_err(|e| format!("Failed to create GIF encoder: {e}"))?;
        encoder
            .set_repeat(repeat)
            .map_err(|e| format!("Failed to set GIF repeat: {e}"))?;

        for frame in slots.into_iter().flatten() {
            encoder
                .write_frame(&frame)
                .map_err(|e| format!("Failed to write GIF frame: {e}"))?;
        }
    }

    Ok(Some(buffer))
}

/// Reduce one RGBA frame to a 256-colour palette frame.
fn quantize(captured: CapturedFrame, width: u16, height: u16, speed: i32) -> Frame<'static> {
    let delay = captured.delay_centiseconds();
    let mut pixels = captured.image.into_raw();
    let mut frame = Frame::from_rgba_speed(width, height, &mut pixels, speed);
    frame.delay = delay;
    frame
}
