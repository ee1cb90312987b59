use std::env;
use std::path::{Path, PathBuf};

/// Homebrew prefixes searched for an FFmpeg install on macOS.
const HOMEBREW_PREFIXES: [&str; 2] = ["/opt/homebrew/opt/ffmpeg", "/usr/local/opt/ffmpeg"];

fn main() {
    for variable in ["FFMPEG_DIR", "PKG_CONFIG_PATH", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
        "windows" => hint_vcpkg(),
        "macos" => hint_homebrew(),
        _ => {}
    }
}

fn hint_vcpkg() {
    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=clip2gif needs FFmpeg. Install it with vcpkg and set FFMPEG_DIR to the installed triplet directory."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    report_candidate(&candidate);
}

fn hint_homebrew() {
    if let Some(candidate) = HOMEBREW_PREFIXES
        .iter()
        .map(Path::new)
        .find(|prefix| prefix.exists())
    {
        report_candidate(candidate);
    }
}

fn report_candidate(candidate: &Path) {
    if candidate.exists() {
        println!(
            "cargo:warning=Found FFmpeg at {}; set FFMPEG_DIR={} if linking fails.",
            candidate.display(),
            candidate.display(),
        );
    } else {
        println!(
            "cargo:warning=No FFmpeg install found at {}.",
            candidate.display()
        );
    }
}
