//! Synthetic media backend shared by the integration tests.
//!
//! Lets the pipeline run end to end without FFmpeg fixtures: sources paint
//! a colour derived from the playhead, and encoders are either the real
//! [`GifEncoder`] or a scripted one that emits one event per tick.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use clip2gif::{
    CapturedFrame, ConversionError, ConversionObserver, DrawingSurface, EncoderEvent,
    EncoderSettings, FrameEncoder, GifEncoder, MediaBackend, ObjectUrl, ProgressInfo,
    VideoInput, VideoMetadata, VideoSource,
};

// ── Counters ───────────────────────────────────────────────────────

/// Side effects observed by the backend, source and encoder.
#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
    pub encoders_created: AtomicUsize,
    pub encoders_dropped: AtomicUsize,
    pub aborts: AtomicUsize,
    pub frames_added: AtomicUsize,
    pub seeks: Mutex<Vec<Duration>>,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().unwrap().clone()
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

// ── Source ─────────────────────────────────────────────────────────

pub struct SyntheticSource {
    metadata: VideoMetadata,
    position: Duration,
    counters: Arc<Counters>,
}

impl VideoSource for SyntheticSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn seek(&mut self, offset: Duration) -> Result<(), ConversionError> {
        self.position = offset.min(self.metadata.duration);
        self.counters.seeks.lock().unwrap().push(offset);
        Ok(())
    }

    fn render_into(&mut self, surface: &mut DrawingSurface) -> Result<(), ConversionError> {
        let shade = (self.position.as_millis() % 256) as u8;
        surface.fill([shade, 255 - shade, 96, 255]);
        Ok(())
    }

    fn release(self) {
        bump(&self.counters.released);
    }
}

// ── Encoders ───────────────────────────────────────────────────────

/// Emits a fixed script of events, one per poll round.
pub struct ScriptedEncoder {
    script: VecDeque<EncoderEvent>,
    pending: VecDeque<EncoderEvent>,
    rendering: bool,
    aborted: bool,
    skip_next_poll: bool,
    counters: Arc<Counters>,
}

impl ScriptedEncoder {
    fn new(script: Vec<EncoderEvent>, counters: Arc<Counters>) -> Self {
        Self {
            script: script.into(),
            pending: VecDeque::new(),
            rendering: false,
            aborted: false,
            skip_next_poll: false,
            counters,
        }
    }
}

impl FrameEncoder for ScriptedEncoder {
    fn add_frame(&mut self, _frame: CapturedFrame) -> Result<(), ConversionError> {
        bump(&self.counters.frames_added);
        Ok(())
    }

    fn render(&mut self) {
        if !self.rendering && !self.aborted {
            self.rendering = true;
            self.pending.extend(self.script.drain(..));
        }
    }

    fn abort(&mut self) {
        bump(&self.counters.aborts);
        if !self.aborted {
            self.aborted = true;
            self.pending.clear();
            self.pending.push_back(EncoderEvent::Aborted);
        }
    }

    fn poll_event(&mut self) -> Option<EncoderEvent> {
        // Alternate so each drain round yields a single event.
        if self.skip_next_poll {
            self.skip_next_poll = false;
            return None;
        }
        let event = self.pending.pop_front()?;
        self.skip_next_poll = true;
        Some(event)
    }
}

impl Drop for ScriptedEncoder {
    fn drop(&mut self) {
        bump(&self.counters.encoders_dropped);
    }
}

pub enum TestEncoder {
    Gif(GifEncoder),
    Scripted(ScriptedEncoder),
}

impl FrameEncoder for TestEncoder {
    fn add_frame(&mut self, frame: CapturedFrame) -> Result<(), ConversionError> {
        match self {
            TestEncoder::Gif(encoder) => encoder.add_frame(frame),
            TestEncoder::Scripted(encoder) => encoder.add_frame(frame),
        }
    }

    fn render(&mut self) {
        match self {
            TestEncoder::Gif(encoder) => encoder.render(),
            TestEncoder::Scripted(encoder) => encoder.render(),
        }
    }

    fn abort(&mut self) {
        match self {
            TestEncoder::Gif(encoder) => encoder.abort(),
            TestEncoder::Scripted(encoder) => encoder.abort(),
        }
    }

    fn poll_event(&mut self) -> Option<EncoderEvent> {
        match self {
            TestEncoder::Gif(encoder) => encoder.poll_event(),
            TestEncoder::Scripted(encoder) => encoder.poll_event(),
        }
    }
}

/// Which encoder the backend hands out.
#[derive(Debug, Clone)]
pub enum EncoderMode {
    Gif,
    Scripted(Vec<EncoderEvent>),
    FailOnCreate(String),
}

/// Progress steps then a small fake GIF.
pub fn successful_script() -> Vec<EncoderEvent> {
    vec![
        EncoderEvent::Progress(0.25),
        EncoderEvent::Progress(0.5),
        EncoderEvent::Progress(0.75),
        EncoderEvent::Progress(1.0),
        EncoderEvent::Finished(b"GIF89a-scripted".to_vec()),
    ]
}

/// Progress that never reaches a terminal event; only an abort ends it.
pub fn endless_script() -> Vec<EncoderEvent> {
    (1..=200)
        .map(|step| EncoderEvent::Progress(step as f32 / 400.0))
        .collect()
}

// ── Backend ────────────────────────────────────────────────────────

pub struct SyntheticBackend {
    pub metadata: VideoMetadata,
    pub environment_error: Option<String>,
    pub encoder: EncoderMode,
    pub counters: Arc<Counters>,
}

impl SyntheticBackend {
    /// A 32x24, two-second source encoded by the real GIF encoder.
    pub fn new() -> Self {
        Self {
            metadata: VideoMetadata::new(32, 24, Duration::from_secs(2)),
            environment_error: None,
            encoder: EncoderMode::Gif,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.metadata.width = width;
        self.metadata.height = height;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.metadata.duration = duration;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderMode) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn unsupported(mut self, reason: &str) -> Self {
        self.environment_error = Some(reason.to_string());
        self
    }

    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

impl MediaBackend for SyntheticBackend {
    type Source = SyntheticSource;
    type Encoder = TestEncoder;

    fn check_environment(&self) -> Result<(), ConversionError> {
        match &self.environment_error {
            Some(reason) => Err(ConversionError::EnvironmentUnsupported {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn open_source(&mut self, _input: &VideoInput) -> Result<Self::Source, ConversionError> {
        bump(&self.counters.opened);
        Ok(SyntheticSource {
            metadata: self.metadata.clone(),
            position: Duration::ZERO,
            counters: Arc::clone(&self.counters),
        })
    }

    fn create_encoder(
        &mut self,
        settings: EncoderSettings,
    ) -> Result<Self::Encoder, ConversionError> {
        match &self.encoder {
            EncoderMode::Gif => {
                let encoder = GifEncoder::new(settings)?;
                bump(&self.counters.encoders_created);
                Ok(TestEncoder::Gif(encoder))
            }
            EncoderMode::Scripted(script) => {
                bump(&self.counters.encoders_created);
                Ok(TestEncoder::Scripted(ScriptedEncoder::new(
                    script.clone(),
                    Arc::clone(&self.counters),
                )))
            }
            EncoderMode::FailOnCreate(detail) => {
                Err(ConversionError::EncoderError(detail.clone()))
            }
        }
    }
}

// ── Observer ───────────────────────────────────────────────────────

/// Records every callback. When watching counters, it also snapshots how
/// many sources had been released when the outcome arrived.
#[derive(Default)]
pub struct RecordingObserver {
    progress: Mutex<Vec<u8>>,
    successes: Mutex<Vec<ObjectUrl>>,
    errors: Mutex<Vec<ConversionError>>,
    watched: Option<Arc<Counters>>,
    released_at_outcome: Mutex<Option<usize>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn watching(counters: Arc<Counters>) -> Arc<Self> {
        Arc::new(Self {
            watched: Some(counters),
            ..Self::default()
        })
    }

    pub fn progress(&self) -> Vec<u8> {
        self.progress.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<ObjectUrl> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<ConversionError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn terminal_count(&self) -> usize {
        self.successes.lock().unwrap().len() + self.errors.lock().unwrap().len()
    }

    pub fn released_at_outcome(&self) -> Option<usize> {
        *self.released_at_outcome.lock().unwrap()
    }

    fn snapshot(&self) {
        if let Some(counters) = &self.watched {
            *self.released_at_outcome.lock().unwrap() = Some(Counters::get(&counters.released));
        }
    }
}

impl ConversionObserver for RecordingObserver {
    fn on_progress(&self, info: &ProgressInfo) {
        self.progress.lock().unwrap().push(info.percentage);
    }

    fn on_success(&self, url: &ObjectUrl) {
        self.snapshot();
        self.successes.lock().unwrap().push(url.clone());
    }

    fn on_error(&self, error: &ConversionError) {
        self.snapshot();
        self.errors.lock().unwrap().push(error.clone());
    }
}

pub fn video_input() -> VideoInput {
    VideoInput::open("clip.mp4")
}
