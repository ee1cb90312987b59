//! Conversion orchestration integration tests.
//!
//! These drive the full state machine over the synthetic backend, with
//! either the real GIF encoder or a scripted one.

mod common;

use std::sync::Arc;
use std::time::Duration;

use clip2gif::{
    ConversionError, ConversionOptions, ConversionState, EncoderEvent, ImmediateClock,
    ObjectStore, Tick, VideoInput, start_conversion,
};

use common::{
    Counters, EncoderMode, RecordingObserver, SyntheticBackend, successful_script, video_input,
};

fn assert_non_decreasing(progress: &[u8]) {
    assert!(
        progress.windows(2).all(|pair| pair[0] <= pair[1]),
        "progress went backwards: {progress:?}"
    );
}

// ── Success ────────────────────────────────────────────────────────

#[test]
fn converts_with_gif_encoder() {
    let backend = SyntheticBackend::new();
    let counters = backend.counters();
    let observer = RecordingObserver::watching(Arc::clone(&counters));
    let store = Arc::new(ObjectStore::new());
    let options = ConversionOptions::new()
        .with_total_frames(10)
        .with_object_store(Arc::clone(&store));

    let mut conversion = start_conversion(backend, video_input(), options, observer.clone());
    assert_eq!(conversion.state(), ConversionState::Idle);

    let url = conversion
        .run_with_clock(&mut ImmediateClock)
        .expect("conversion should succeed");

    assert_eq!(conversion.state(), ConversionState::Finalized);
    assert_eq!(observer.successes(), vec![url.clone()]);
    assert!(observer.errors().is_empty());

    let bytes = store.get(&url).expect("GIF should be in the store");
    assert!(bytes.starts_with(b"GIF89a"));

    let progress = observer.progress();
    assert_non_decreasing(&progress);
    assert_eq!(&progress[..10], &[5, 10, 15, 20, 25, 30, 35, 40, 45, 50]);
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.iter().all(|&p| p <= 100));

    assert_eq!(Counters::get(&counters.opened), 1);
    assert_eq!(Counters::get(&counters.released), 1);
    assert_eq!(observer.released_at_outcome(), Some(1));
}

#[test]
fn scripted_encoding_maps_onto_upper_half() {
    let backend =
        SyntheticBackend::new().with_encoder(EncoderMode::Scripted(successful_script()));
    let counters = backend.counters();
    let observer = RecordingObserver::watching(Arc::clone(&counters));
    let options = ConversionOptions::new().with_total_frames(10);

    let mut conversion = start_conversion(backend, video_input(), options, observer.clone());
    conversion.run_with_clock(&mut ImmediateClock).unwrap();

    assert_eq!(
        observer.progress(),
        vec![5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 63, 75, 88, 100]
    );
    assert_eq!(Counters::get(&counters.frames_added), 10);
    assert_eq!(Counters::get(&counters.encoders_dropped), 1);
    assert_eq!(observer.released_at_outcome(), Some(1));
}

#[test]
fn states_advance_in_order() {
    let backend =
        SyntheticBackend::new().with_encoder(EncoderMode::Scripted(successful_script()));
    let observer = RecordingObserver::new();
    let options = ConversionOptions::new().with_total_frames(4);
    let mut conversion = start_conversion(backend, video_input(), options, observer);

    let mut states = vec![conversion.state()];
    while conversion.tick() == Tick::Pending {
        let state = conversion.state();
        if states.last() != Some(&state) {
            states.push(state);
        }
    }
    states.push(conversion.state());
    states.dedup();

    assert_eq!(
        states,
        vec![
            ConversionState::Idle,
            ConversionState::Sampling,
            ConversionState::Encoding,
            ConversionState::Finalized,
        ]
    );
}

#[test]
fn one_frame_per_tick_while_sampling() {
    let backend =
        SyntheticBackend::new().with_encoder(EncoderMode::Scripted(successful_script()));
    let observer = RecordingObserver::new();
    let options = ConversionOptions::new().with_total_frames(10);
    let mut conversion = start_conversion(backend, video_input(), options, observer);

    assert_eq!(conversion.tick(), Tick::Pending);
    assert_eq!(conversion.state(), ConversionState::Sampling);
    assert_eq!(conversion.frames_captured(), 0);

    for expected in 1..=3 {
        conversion.tick();
        assert_eq!(conversion.frames_captured(), expected);
    }
}

#[test]
fn ticking_after_finish_does_nothing() {
    let backend =
        SyntheticBackend::new().with_encoder(EncoderMode::Scripted(successful_script()));
    let observer = RecordingObserver::new();
    let options = ConversionOptions::new().with_total_frames(10);
    let mut conversion = start_conversion(backend, video_input(), options, observer.clone());
    conversion.run_with_clock(&mut ImmediateClock).unwrap();
    let reports = observer.progress().len();

    assert_eq!(conversion.tick(), Tick::Finished);
    conversion.cancel_handle().cancel();
    assert_eq!(conversion.tick(), Tick::Finished);

    assert_eq!(observer.terminal_count(), 1);
    assert_eq!(observer.progress().len(), reports);
    assert!(matches!(conversion.outcome(), Some(Ok(_))));
}

// ── Preconditions ──────────────────────────────────────────────────

#[test]
fn non_video_input_fails_synchronously() {
    let backend = SyntheticBackend::new();
    let counters = backend.counters();
    let observer = RecordingObserver::new();
    let input = VideoInput::open("notes.txt");

    let conversion = start_conversion(backend, input, ConversionOptions::new(), observer.clone());

    assert_eq!(conversion.state(), ConversionState::Finalized);
    let errors = observer.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "Please select a video file.");
    assert!(observer.progress().is_empty());
    assert_eq!(Counters::get(&counters.opened), 0);
}

#[test]
fn unsupported_environment_fails_synchronously() {
    let backend = SyntheticBackend::new().unsupported("no worker threads");
    let counters = backend.counters();
    let observer = RecordingObserver::new();

    let conversion =
        start_conversion(backend, video_input(), ConversionOptions::new(), observer.clone());

    assert!(conversion.is_finished());
    assert_eq!(
        observer.errors()[0].to_string(),
        "Your system does not support the required features for GIF conversion."
    );
    assert!(observer.progress().is_empty());
    assert_eq!(Counters::get(&counters.opened), 0);
}

#[test]
fn environment_is_checked_before_media_type() {
    let backend = SyntheticBackend::new().unsupported("no decoder");
    let observer = RecordingObserver::new();
    start_conversion(
        backend,
        VideoInput::open("notes.txt"),
        ConversionOptions::new(),
        observer.clone(),
    );

    assert!(matches!(
        observer.errors()[0],
        ConversionError::EnvironmentUnsupported { .. }
    ));
}

#[test]
fn zero_frames_fails_synchronously() {
    let backend = SyntheticBackend::new();
    let observer = RecordingObserver::new();
    let options = ConversionOptions::new().with_total_frames(0);

    let conversion = start_conversion(backend, video_input(), options, observer.clone());

    assert!(conversion.is_finished());
    assert_eq!(observer.errors(), vec![ConversionError::InvalidFrameCount(0)]);
}

// ── Failures during the run ────────────────────────────────────────

#[test]
fn zero_sized_video_reports_missing_surface() {
    let backend = SyntheticBackend::new().with_dimensions(0, 0);
    let counters = backend.counters();
    let observer = RecordingObserver::watching(Arc::clone(&counters));

    let mut conversion =
        start_conversion(backend, video_input(), ConversionOptions::new(), observer.clone());
    let error = conversion.run_with_clock(&mut ImmediateClock).unwrap_err();

    assert_eq!(error.to_string(), "Drawing surface is not available.");
    assert_eq!(Counters::get(&counters.encoders_created), 0);
    assert_eq!(observer.released_at_outcome(), Some(1));
    assert!(observer.progress().is_empty());
}

#[test]
fn encoder_creation_failure_releases_source() {
    let backend = SyntheticBackend::new()
        .with_encoder(EncoderMode::FailOnCreate("worker script missing".to_string()));
    let counters = backend.counters();
    let observer = RecordingObserver::watching(Arc::clone(&counters));

    let mut conversion =
        start_conversion(backend, video_input(), ConversionOptions::new(), observer.clone());
    let error = conversion.run_with_clock(&mut ImmediateClock).unwrap_err();

    assert_eq!(
        error.to_string(),
        "Error during conversion: worker script missing"
    );
    assert_eq!(observer.released_at_outcome(), Some(1));
    assert_eq!(observer.terminal_count(), 1);
}

#[test]
fn encoder_error_is_reported_with_detail() {
    let script = vec![
        EncoderEvent::Progress(0.5),
        EncoderEvent::Error("palette overflow".to_string()),
    ];
    let backend = SyntheticBackend::new().with_encoder(EncoderMode::Scripted(script));
    let counters = backend.counters();
    let observer = RecordingObserver::watching(Arc::clone(&counters));
    let options = ConversionOptions::new().with_total_frames(10);

    let mut conversion = start_conversion(backend, video_input(), options, observer.clone());
    let error = conversion.run_with_clock(&mut ImmediateClock).unwrap_err();

    assert_eq!(error, ConversionError::EncoderError("palette overflow".to_string()));
    assert_eq!(error.to_string(), "Error during conversion: palette overflow");
    assert_eq!(observer.progress().last(), Some(&75));
    assert!(observer.successes().is_empty());
    assert_eq!(observer.released_at_outcome(), Some(1));
    assert_eq!(Counters::get(&counters.encoders_dropped), 1);
}

#[test]
fn oversized_video_is_rejected_by_gif_encoder() {
    let backend = SyntheticBackend::new().with_dimensions(70_000, 2);
    let counters = backend.counters();
    let observer = RecordingObserver::watching(Arc::clone(&counters));

    let mut conversion =
        start_conversion(backend, video_input(), ConversionOptions::new(), observer.clone());
    let error = conversion.run_with_clock(&mut ImmediateClock).unwrap_err();

    assert!(matches!(error, ConversionError::EncoderError(_)));
    assert_eq!(observer.released_at_outcome(), Some(1));
}

#[test]
fn long_video_samples_late_offsets() {
    let backend = SyntheticBackend::new()
        .with_duration(Duration::from_secs(10))
        .with_encoder(EncoderMode::Scripted(successful_script()));
    let counters = backend.counters();
    let observer = RecordingObserver::new();

    let mut conversion =
        start_conversion(backend, video_input(), ConversionOptions::new(), observer);
    conversion.run_with_clock(&mut ImmediateClock).unwrap();

    let seeks = counters.seeks();
    assert_eq!(seeks.len(), 50);
    assert!((seeks[49].as_secs_f64() - 9.8).abs() < 1e-6);
}
