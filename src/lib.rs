//! # clip2gif
//!
//! Turn video clips into animated GIFs.
//!
//! `clip2gif` samples a fixed number of frames from a video at even time
//! intervals, hands them to a parallel GIF encoder, and reports a single
//! 0–100 progress figure across both phases. Decoding is powered by FFmpeg
//! via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate and
//! palette quantization by the [`gif`](https://crates.io/crates/gif) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use clip2gif::{ConversionCallbacks, ConversionOptions, VideoInput};
//!
//! let options = ConversionOptions::new().with_total_frames(40);
//! let store = Arc::clone(options.object_store());
//!
//! let callbacks = ConversionCallbacks::new(
//!     move |url| {
//!         let bytes = store.get(url).unwrap();
//!         std::fs::write("clip.gif", &bytes[..]).unwrap();
//!     },
//!     |error| eprintln!("{error}"),
//! )
//! .with_progress(|info| println!("{}%", info.percentage));
//!
//! let input = VideoInput::open("clip.mp4");
//! let mut conversion = clip2gif::convert_video_to_gif(input, options, Arc::new(callbacks));
//! let cancel = conversion.cancel_handle(); // hand this to whoever may abort
//! conversion.run().ok();
//! # drop(cancel);
//! ```
//!
//! ## How a conversion runs
//!
//! - **Preconditions**: the environment, the input's media type, and the
//!   frame count are checked synchronously when the conversion starts.
//! - **Sampling** (0–50%): one frame per tick, at offsets
//!   `i * duration / total_frames`, each shown for `duration / total_frames`.
//! - **Encoding** (50–100%): frames are quantized on a worker pool and
//!   written in order.
//! - **Outcome**: exactly one of `on_success(url)` or `on_error(error)`;
//!   the finished GIF lives in an [`ObjectStore`].
//! - **Cancellation**: [`CancelHandle::cancel`] asks the encoder to abort;
//!   the conversion reports "GIF conversion aborted." once it has.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`convert_stream`] runs a conversion on Tokio and streams its events |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod blob;
pub mod config;
pub mod conversion;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod gif;
pub mod input;
pub mod media;
pub mod metadata;
pub mod progress;
pub mod sampler;
pub mod scheduler;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod surface;
mod utilities;

pub use blob::{ObjectStore, ObjectUrl};
pub use config::{ConversionOptions, DEFAULT_TOTAL_FRAMES, FRAME_COUNT_RANGE, clamp_frame_count};
pub use conversion::{
    Conversion, ConversionState, MediaBackend, Tick, convert_video_to_gif, start_conversion,
};
pub use encoder::{EncoderEvent, EncoderSettings, FrameEncoder};
pub use error::ConversionError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use crate::gif::GifEncoder;
pub use input::{VideoInput, output_file_name};
pub use media::{FfmpegBackend, MediaFile};
pub use metadata::VideoMetadata;
pub use progress::{
    CancelHandle, ConversionCallbacks, ConversionObserver, ConversionPhase, ProgressInfo,
};
pub use sampler::{FrameRequest, FrameSampler, SampleStep};
pub use scheduler::{FrameClock, ImmediateClock, IntervalClock};
pub use source::VideoSource;
#[cfg(feature = "async")]
pub use stream::{ConversionEvent, ConversionStream, convert_stream};
pub use surface::{CapturedFrame, DrawingSurface};
