//! Verbosity of FFmpeg's own console output.
//!
//! FFmpeg writes decoder warnings straight to stderr, outside the `log`
//! facade. Seeking and decoding dozens of instants per conversion can make
//! that noisy, so callers pick a level here without importing `ffmpeg-next`.
//!
//! ```no_run
//! use clip2gif::FfmpegLogLevel;
//!
//! let level: FfmpegLogLevel = "warn".parse().unwrap();
//! clip2gif::set_ffmpeg_log_level(level);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// How much FFmpeg prints, from nothing to everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FfmpegLogLevel {
    Quiet,
    Fatal,
    Error,
    /// FFmpeg's own default.
    Warning,
    Info,
    Debug,
}

impl FfmpegLogLevel {
    /// Every level, quietest first.
    pub const ALL: [FfmpegLogLevel; 6] = [
        FfmpegLogLevel::Quiet,
        FfmpegLogLevel::Fatal,
        FfmpegLogLevel::Error,
        FfmpegLogLevel::Warning,
        FfmpegLogLevel::Info,
        FfmpegLogLevel::Debug,
    ];

    /// Canonical lower-case name, accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Debug => "debug",
        }
    }
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        let alias = match value.as_str() {
            "off" | "none" => "quiet",
            "panic" => "fatal",
            "warn" => "warning",
            "verbose" => "info",
            "trace" => "debug",
            other => other,
        };

        Self::ALL
            .into_iter()
            .find(|level| level.name() == alias)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|level| level.name()).collect();
                format!("unknown FFmpeg log level '{value}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Set FFmpeg's console verbosity. The crate's `log` output is unaffected.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    log::debug!("FFmpeg log level -> {level}");
    ffmpeg_next::util::log::set_level(level.into());
}
