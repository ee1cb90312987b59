//! Input and output naming tests.

use std::path::Path;

use clip2gif::{VideoInput, input::guess_media_type, output_file_name};

#[test]
fn video_extensions_are_videos() {
    for name in ["a.mp4", "b.MOV", "c.webm", "d.mkv", "e.avi", "f.m4v"] {
        let input = VideoInput::open(name);
        assert!(input.is_video(), "{name} should be a video ({})", input.media_type());
    }
}

#[test]
fn other_files_are_not_videos() {
    for name in ["notes.txt", "song.mp3", "still.png", "anim.gif", "no_extension"] {
        assert!(!VideoInput::open(name).is_video(), "{name} is not a video");
    }
}

#[test]
fn media_type_override_wins() {
    let input = VideoInput::open("capture.bin").with_media_type("video/mp4");
    assert!(input.is_video());
    assert_eq!(input.media_type(), "video/mp4");

    let input = VideoInput::open("clip.mp4").with_media_type("application/json");
    assert!(!input.is_video());
}

#[test]
fn guesses_are_case_insensitive() {
    assert_eq!(guess_media_type(Path::new("CLIP.MP4")), "video/mp4");
    assert_eq!(guess_media_type(Path::new("clip.Mov")), "video/quicktime");
    assert_eq!(guess_media_type(Path::new("readme.txt")), "text/plain");
}

// ── Output names ───────────────────────────────────────────────────

#[test]
fn output_name_replaces_last_extension() {
    assert_eq!(output_file_name(Some("holiday.mp4")), "holiday.gif");
    assert_eq!(output_file_name(Some("archive.tar.webm")), "archive.tar.gif");
    assert_eq!(output_file_name(Some("raw")), "raw.gif");
}

#[test]
fn output_name_falls_back_to_default() {
    assert_eq!(output_file_name(None), "generated.gif");
    assert_eq!(output_file_name(Some("")), "generated.gif");
    assert_eq!(output_file_name(Some(".mp4")), "generated.gif");
}

#[test]
fn input_suggests_output_from_file_name() {
    let input = VideoInput::open("/videos/trip/day-one.mov");
    assert_eq!(input.output_file_name(), "day-one.gif");
}
