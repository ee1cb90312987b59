//! FFmpeg-backed video source.
//!
//! [`MediaFile`] opens a file with FFmpeg, caches the best video stream's
//! metadata, and implements [`VideoSource`] by seeking the demuxer to the
//! nearest keyframe and decoding forward to the requested instant.
//! [`FfmpegBackend`] plugs it into the conversion pipeline together with
//! [`GifEncoder`].

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{
    conversion::MediaBackend,
    encoder::EncoderSettings,
    error::ConversionError,
    gif::GifEncoder,
    input::VideoInput,
    metadata::VideoMetadata,
    source::VideoSource,
    surface::DrawingSurface,
    utilities::{
        av_time_to_seconds, frame_to_buffer, pts_to_duration, pts_to_seconds,
        rate_to_frames_per_second, seconds_to_seek_timestamp, timestamp_is_set,
    },
};

/// Bytes per pixel of the RGBA frames handed to the surface.
const RGBA_BYTES_PER_PIXEL: usize = 4;

/// A video file opened for sampling.
///
/// # Example
///
/// ```no_run
/// use clip2gif::{ConversionError, MediaFile};
///
/// let media = MediaFile::open("input.mp4")?;
/// let metadata = media.video_metadata();
/// println!("{}x{} for {:?}", metadata.width, metadata.height, metadata.duration);
/// # Ok::<(), ConversionError>(())
/// ```
pub struct MediaFile {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    timing: StreamTiming,
    metadata: VideoMetadata,
    position: Duration,
    file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("start_seconds", &self.timing.start_seconds)
            .field("position", &self.position)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file and prepare its best video stream for sampling.
    ///
    /// # Errors
    ///
    /// - [`ConversionError::FileOpen`] if FFmpeg cannot open the file.
    /// - [`ConversionError::NoVideoStream`] if it has no video stream.
    /// - [`ConversionError::VideoDecodeError`] if the video reports no
    ///   duration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConversionError> {
        let file_path = path.as_ref().to_path_buf();
        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| ConversionError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&file_path).map_err(|error| ConversionError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(ConversionError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();

        let mut frames_per_second = rate_to_frames_per_second(stream.avg_frame_rate());
        if frames_per_second == 0.0 {
            frames_per_second = rate_to_frames_per_second(stream.rate());
        }

        // Prefer the container duration; fall back to the stream's own.
        let duration = if input_context.duration() > 0 {
            Duration::from_micros(input_context.duration() as u64)
        } else if stream.duration() > 0 {
            pts_to_duration(stream.duration(), time_base)
        } else {
            Duration::ZERO
        };

        // Sample offsets count from the first frame, not from timestamp zero.
        let start_seconds = if timestamp_is_set(stream.start_time()) {
            pts_to_seconds(stream.start_time(), time_base)
        } else {
            // SAFETY: `input_context` owns a valid format context for as long
            // as it lives, and this only reads a plain field.
            let container_start = unsafe { (*input_context.as_ptr()).start_time };
            if timestamp_is_set(container_start) {
                av_time_to_seconds(container_start)
            } else {
                0.0
            }
        };
        let timing = StreamTiming {
            time_base,
            start_seconds: if start_seconds.is_finite() {
                start_seconds
            } else {
                0.0
            },
            frame_interval: if frames_per_second > 0.0 {
                1.0 / frames_per_second
            } else {
                0.0
            },
        };

        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        if duration.is_zero() {
            return Err(ConversionError::VideoDecodeError(format!(
                "{} reports no duration",
                file_path.display()
            )));
        }

        let width = decoder.width();
        let height = decoder.height();
        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGBA,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        log::info!(
            "Opened {}: {width}x{height}, {:.2} fps, {duration:?} [{codec}]",
            file_path.display(),
            frames_per_second,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            timing,
            metadata: VideoMetadata {
                width,
                height,
                duration,
                frames_per_second,
                codec,
            },
            position: Duration::ZERO,
            file_path,
        })
    }

    /// Cached metadata of the video stream.
    pub fn video_metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Half a frame at the stream's rate, so a frame starting just before
    /// the target still counts as visible at the target.
    fn tolerance_seconds(&self) -> f64 {
        if self.metadata.frames_per_second > 0.0 {
            0.5 / self.metadata.frames_per_second
        } else {
            0.0
        }
    }
}

impl VideoSource for MediaFile {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn seek(&mut self, offset: Duration) -> Result<(), ConversionError> {
        self.position = offset.min(self.metadata.duration);
        Ok(())
    }

    fn render_into(&mut self, surface: &mut DrawingSurface) -> Result<(), ConversionError> {
        let target = self.position.as_secs_f64() - self.tolerance_seconds();
        let timestamp =
            seconds_to_seek_timestamp(self.position.as_secs_f64() + self.timing.start_seconds);

        // Land on the keyframe at or before the target, then decode forward.
        self.input_context.seek(timestamp, ..timestamp)?;
        self.decoder.flush();

        let stream_index = self.video_stream_index;
        let timing = self.timing;
        let mut decoded = VideoFrame::empty();
        let mut fallback: Option<VideoFrame> = None;
        let mut previous: Option<f64> = None;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let seconds = timing.frame_seconds(&decoded, previous);
                if seconds >= target {
                    return blit(&mut self.scaler, &decoded, surface);
                }
                previous = Some(seconds);
                fallback = Some(decoded.clone());
            }
        }

        self.decoder.send_eof()?;
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let seconds = timing.frame_seconds(&decoded, previous);
            if seconds >= target {
                return blit(&mut self.scaler, &decoded, surface);
            }
            previous = Some(seconds);
            fallback = Some(decoded.clone());
        }

        // Past the last frame: show whatever was decoded last.
        match fallback {
            Some(frame) => blit(&mut self.scaler, &frame, surface),
            None => Err(ConversionError::VideoDecodeError(format!(
                "Could not locate a frame at {:?}",
                self.position
            ))),
        }
    }

    fn release(self) {
        log::debug!("Releasing media file: {}", self.file_path.display());
    }
}

/// How decoded timestamps map onto offsets from the start of the video.
#[derive(Debug, Clone, Copy)]
struct StreamTiming {
    time_base: Rational,
    /// Presentation time of the first frame.
    start_seconds: f64,
    /// Nominal frame spacing, `0.0` when the rate is unknown.
    frame_interval: f64,
}

impl StreamTiming {
    /// Presentation time of `frame` relative to the first frame.
    ///
    /// Frames carrying no timestamp are placed one frame after `previous`.
    fn frame_seconds(&self, frame: &VideoFrame, previous: Option<f64>) -> f64 {
        match frame.timestamp().or_else(|| frame.pts()) {
            Some(pts) => pts_to_seconds(pts, self.time_base) - self.start_seconds,
            None => {
                log::warn!("Decoded frame has no timestamp; assuming one frame after the last");
                previous.map_or(0.0, |seconds| seconds + self.frame_interval)
            }
        }
    }
}

fn blit(
    scaler: &mut ScalingContext,
    frame: &VideoFrame,
    surface: &mut DrawingSurface,
) -> Result<(), ConversionError> {
    let mut rgba_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgba_frame)?;
    let pixels = frame_to_buffer(
        &rgba_frame,
        surface.width(),
        surface.height(),
        RGBA_BYTES_PER_PIXEL,
    );
    surface.draw_rgba(&pixels)
}

/// The production backend: FFmpeg sources and [`GifEncoder`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl MediaBackend for FfmpegBackend {
    type Source = MediaFile;
    type Encoder = GifEncoder;

    fn check_environment(&self) -> Result<(), ConversionError> {
        ffmpeg_next::init().map_err(|error| ConversionError::EnvironmentUnsupported {
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;
        std::thread::available_parallelism().map_err(|error| {
            ConversionError::EnvironmentUnsupported {
                reason: format!("worker threads unavailable: {error}"),
            }
        })?;
        Ok(())
    }

    fn open_source(&mut self, input: &VideoInput) -> Result<MediaFile, ConversionError> {
        MediaFile::open(input.path())
    }

    fn create_encoder(&mut self, settings: EncoderSettings) -> Result<GifEncoder, ConversionError> {
        GifEncoder::new(settings)
    }
}
