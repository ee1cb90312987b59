//! Async conversion as a stream of events.
//!
//! [`ConversionStream`] runs a whole conversion on a Tokio blocking thread
//! and forwards every observer callback through a bounded channel. Progress
//! arrives as [`ConversionEvent::Progress`], and the stream ends after the
//! single terminal event. Dropping the stream cancels the conversion.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use clip2gif::{ConversionEvent, ConversionOptions, FfmpegBackend, VideoInput};
//!
//! # async fn example() {
//! let mut stream = clip2gif::convert_stream(
//!     FfmpegBackend::new(),
//!     VideoInput::open("input.mp4"),
//!     ConversionOptions::new(),
//! );
//!
//! while let Some(event) = stream.next().await {
//!     match event {
//!         ConversionEvent::Progress(info) => println!("{}%", info.percentage),
//!         ConversionEvent::Succeeded(url) => println!("done: {url}"),
//!         ConversionEvent::Failed(error) => eprintln!("{error}"),
//!     }
//! }
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc::{Receiver, Sender};
use tokio_stream::Stream;

use crate::blob::ObjectUrl;
use crate::config::ConversionOptions;
use crate::conversion::{MediaBackend, start_conversion};
use crate::error::ConversionError;
use crate::input::VideoInput;
use crate::progress::{CancelHandle, ConversionObserver, ProgressInfo};
use crate::scheduler::IntervalClock;

/// Bounded-channel capacity for [`ConversionStream`].
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// One observer callback, as a value.
#[derive(Debug, Clone)]
pub enum ConversionEvent {
    /// Overall progress changed.
    Progress(ProgressInfo),
    /// The GIF is ready at this URL.
    Succeeded(ObjectUrl),
    /// The conversion failed or was aborted.
    Failed(ConversionError),
}

/// A stream of [`ConversionEvent`]s from a conversion running in the
/// background.
///
/// Dropping the stream cancels the conversion; the background thread stops
/// at its next tick and releases the source.
pub struct ConversionStream {
    receiver: Receiver<ConversionEvent>,
    cancel: CancelHandle,
}

impl ConversionStream {
    /// Request cancellation of the background conversion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels the background conversion.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

impl Drop for ConversionStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for ConversionStream {
    type Item = ConversionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Forwards callbacks into the stream's channel.
struct ChannelObserver {
    sender: Sender<ConversionEvent>,
    cancel: CancelHandle,
}

impl ChannelObserver {
    fn forward(&self, event: ConversionEvent) {
        if self.sender.blocking_send(event).is_err() {
            // Nobody is listening any more.
            self.cancel.cancel();
        }
    }
}

impl ConversionObserver for ChannelObserver {
    fn on_progress(&self, info: &ProgressInfo) {
        self.forward(ConversionEvent::Progress(info.clone()));
    }

    fn on_success(&self, url: &ObjectUrl) {
        self.forward(ConversionEvent::Succeeded(url.clone()));
    }

    fn on_error(&self, error: &ConversionError) {
        self.forward(ConversionEvent::Failed(error.clone()));
    }
}

/// Run a conversion on a blocking thread and stream its events.
///
/// Must be called from within a Tokio runtime.
pub fn convert_stream<B>(backend: B, input: VideoInput, options: ConversionOptions) -> ConversionStream
where
    B: MediaBackend + Send + 'static,
{
    let cancel = options.cancellation.clone().unwrap_or_default();
    let options = options.with_cancellation(cancel.clone());
    let (sender, receiver) = tokio::sync::mpsc::channel(DEFAULT_CHANNEL_CAPACITY);

    let observer = Arc::new(ChannelObserver {
        sender,
        cancel: cancel.clone(),
    });
    // Detached; the conversion reports through the channel.
    tokio::task::spawn_blocking(move || {
        let mut conversion = start_conversion(backend, input, options, observer);
        let _ = conversion.run_with_clock(&mut IntervalClock::animation_frame());
    });

    ConversionStream { receiver, cancel }
}
