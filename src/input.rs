//! Conversion inputs and output naming.
//!
//! A [`VideoInput`] is a file plus the media type it declares. The type is
//! guessed from the extension unless the caller supplies one, and only
//! `video/*` inputs are accepted for conversion.

use std::path::{Path, PathBuf};

/// Output name used when the input has no usable file name.
pub const DEFAULT_OUTPUT_NAME: &str = "generated.gif";

/// Extension of the produced files.
pub const OUTPUT_EXTENSION: &str = "gif";

/// Media type reported for unknown extensions.
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// A file handed to the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInput {
    path: PathBuf,
    media_type: String,
}

impl VideoInput {
    /// Describe the file at `path`, guessing its media type from the
    /// extension.
    ///
    /// The file is not touched; opening happens once the conversion starts.
    ///
    /// # Example
    ///
    /// ```
    /// use clip2gif::VideoInput;
    ///
    /// assert_eq!(VideoInput::open("clip.webm").media_type(), "video/webm");
    /// assert_eq!(VideoInput::open("notes.txt").media_type(), "text/plain");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let media_type = guess_media_type(&path).to_string();
        Self { path, media_type }
    }

    /// Override the declared media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared media type, e.g. `"video/mp4"`.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns `true` if the declared media type is a video type.
    pub fn is_video(&self) -> bool {
        self.media_type.starts_with("video/")
    }

    /// Suggested file name for the converted GIF.
    pub fn output_file_name(&self) -> String {
        output_file_name(self.path.file_name().and_then(|name| name.to_str()))
    }
}

/// Derive the output file name from an input file name.
///
/// The last extension is replaced with `.gif`. Without a name (or with a
/// name that is only an extension) the result is [`DEFAULT_OUTPUT_NAME`].
///
/// # Example
///
/// ```
/// use clip2gif::output_file_name;
///
/// assert_eq!(output_file_name(Some("holiday.final.mp4")), "holiday.final.gif");
/// assert_eq!(output_file_name(None), "generated.gif");
/// ```
pub fn output_file_name(name: Option<&str>) -> String {
    let stem = name
        .map(|name| match name.rfind('.') {
            Some(dot) => &name[..dot],
            None => name,
        })
        .map(str::trim)
        .filter(|stem| !stem.is_empty());

    match stem {
        Some(stem) => format!("{stem}.{OUTPUT_EXTENSION}"),
        None => DEFAULT_OUTPUT_NAME.to_string(),
    }
}

/// Guess a media type from the file extension.
pub fn guess_media_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mp4") => "video/mp4",
        Some("m4v") => "video/x-m4v",
        Some("mov") | Some("qt") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("ogv") => "video/ogg",
        Some("mpeg") | Some("mpg") => "video/mpeg",
        Some("ts") => "video/mp2t",
        Some("3gp") => "video/3gpp",
        Some("flv") => "video/x-flv",
        Some("wmv") => "video/x-ms-wmv",
        Some("gif") => "image/gif",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("txt") => "text/plain",
        _ => UNKNOWN_MEDIA_TYPE,
    }
}
