//! Internal utility functions.
//!
//! Helpers for pixel-data copying and timestamp conversion shared by the
//! FFmpeg source.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy the first plane of an FFmpeg video frame into a tightly-packed
/// buffer, dropping any per-row padding.
///
/// `bytes_per_pixel` is the size of one pixel in the frame's format
/// (4 for RGBA).
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * bytes_per_pixel;
    let rows = height as usize;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * rows].to_vec()
    } else {
        data.chunks(stride)
            .take(rows)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect()
    }
}

/// FFmpeg's marker for an unset timestamp (`AV_NOPTS_VALUE`).
const NO_TIMESTAMP: i64 = i64::MIN;

/// Microseconds per second, the AV_TIME_BASE unit.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Returns `true` unless `timestamp` is FFmpeg's "no value" marker.
pub(crate) fn timestamp_is_set(timestamp: i64) -> bool {
    timestamp != NO_TIMESTAMP
}

/// Convert an absolute position in seconds to a container seek timestamp
/// in AV_TIME_BASE (microseconds), as expected by `Input::seek`.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    if !seconds.is_finite() {
        return 0;
    }
    // Saturating float-to-int cast.
    (seconds * AV_TIME_BASE).round() as i64
}

/// Convert an AV_TIME_BASE value to seconds.
pub(crate) fn av_time_to_seconds(timestamp: i64) -> f64 {
    timestamp as f64 / AV_TIME_BASE
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Stream duration from a PTS span, `Duration::ZERO` when the time base
/// yields a negative or non-finite length.
pub(crate) fn pts_to_duration(pts: i64, time_base: Rational) -> Duration {
    Duration::try_from_secs_f64(pts_to_seconds(pts, time_base)).unwrap_or(Duration::ZERO)
}

/// Frames per second from a rational rate, `0.0` if the rate is unset.
pub(crate) fn rate_to_frames_per_second(rate: Rational) -> f64 {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}
