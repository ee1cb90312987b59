use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use clip2gif::{
    ConversionError, ConversionObserver, ConversionOptions, ConversionPhase, FfmpegLogLevel,
    FrameClock, FrameSampler, IntervalClock, MediaFile, ObjectUrl, ProgressInfo, Tick,
    VideoInput, VideoSource,
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  clip2gif convert clip.mp4 --frames 40 --progress\n  clip2gif convert clip.mov --out loop.gif --quality 5 --loop-count 3\n  clip2gif plan clip.mp4 --frames 20 --json\n  clip2gif probe clip.mp4\n  clip2gif completions zsh > _clip2gif";

#[derive(Debug, Parser)]
#[command(
    name = "clip2gif",
    version,
    about = "Turn video clips into animated GIFs",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a video into an animated GIF.
    #[command(
        about = "Convert a video to GIF",
        after_help = "Examples:\n  clip2gif convert clip.mp4\n  clip2gif convert clip.mp4 --frames 80 --out clip-80.gif --progress"
    )]
    Convert {
        /// Input video path.
        input: PathBuf,
        /// Output GIF path. Defaults to the input name with a .gif extension.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Number of frames to sample.
        #[arg(long, default_value_t = clip2gif::DEFAULT_TOTAL_FRAMES,
              value_parser = clap::value_parser!(u32).range(10..=100))]
        frames: u32,
        /// Palette quality, 1 (best) to 30 (fastest).
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(1..=30))]
        quality: u8,
        /// Encoder worker threads.
        #[arg(long, default_value_t = 2)]
        workers: usize,
        /// Play the animation this many times instead of looping forever.
        #[arg(long)]
        loop_count: Option<u16>,
        /// Override the media type guessed from the file extension.
        #[arg(long)]
        media_type: Option<String>,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
        /// Allow overwriting an existing output file.
        #[arg(long)]
        overwrite: bool,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the sampling plan for a video without converting it.
    #[command(about = "Show sample offsets and frame delays")]
    Plan {
        /// Input video path.
        input: PathBuf,
        /// Number of frames to sample.
        #[arg(long, default_value_t = clip2gif::DEFAULT_TOTAL_FRAMES)]
        frames: u32,
        /// Print the plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print video metadata.
    #[command(about = "Print video metadata", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Print metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Progress bar observer.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(100)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::with_template("{msg:>10} [{bar:40.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }
}

impl ConversionObserver for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_message(phase_label(info.phase));
        self.bar.set_position(info.percentage as u64);
    }

    fn on_success(&self, _url: &ObjectUrl) {
        self.bar.finish_and_clear();
    }

    fn on_error(&self, _error: &ConversionError) {
        self.bar.abandon();
    }
}

fn phase_label(phase: ConversionPhase) -> &'static str {
    match phase {
        ConversionPhase::Sampling => "sampling",
        ConversionPhase::Encoding => "encoding",
        _ => "working",
    }
}

fn resolve_output_path(input: &VideoInput, out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| input.path().with_file_name(input.output_file_name()))
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn convert(
    global: &GlobalOptions,
    input: PathBuf,
    out: Option<PathBuf>,
    frames: u32,
    quality: u8,
    workers: usize,
    loop_count: Option<u16>,
    media_type: Option<String>,
    progress: bool,
    overwrite: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = VideoInput::open(&input);
    if let Some(media_type) = media_type {
        input = input.with_media_type(media_type);
    }
    let output_path = resolve_output_path(&input, out);
    ensure_writable_path(&output_path, overwrite)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))?;

    let options = ConversionOptions::new()
        .with_total_frames(frames)
        .with_quality(quality)
        .with_workers(workers)
        .with_repeat(loop_count);
    let store = Arc::clone(options.object_store());

    if global.verbose {
        eprintln!(
            "{} {} ({}) -> {}",
            "converting".cyan().bold(),
            input.path().display(),
            input.media_type(),
            output_path.display(),
        );
    }

    let observer = Arc::new(TerminalProgress::new(progress && !json));
    let mut conversion = clip2gif::convert_video_to_gif(input, options, observer);
    let cancel = conversion.cancel_handle();

    let mut clock = IntervalClock::animation_frame();
    while conversion.tick() == Tick::Pending {
        if interrupted.load(Ordering::Relaxed) {
            cancel.cancel();
        }
        clock.wait_next_frame();
    }

    let url = match conversion.outcome() {
        Some(Ok(url)) => url.clone(),
        Some(Err(error)) => return Err(error.clone().into()),
        None => return Err("conversion stopped without an outcome".into()),
    };
    let bytes = store
        .get(&url)
        .ok_or_else(|| format!("converted GIF missing from store: {url}"))?;
    fs::write(&output_path, &bytes[..])?;
    store.revoke(&url);

    if json {
        let payload = json!({
            "output": output_path.display().to_string(),
            "bytes": bytes.len(),
            "frames": frames,
            "quality": quality,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} {} ({} bytes)",
            "wrote".green().bold(),
            output_path.display(),
            bytes.len()
        );
    }
    Ok(())
}

fn plan(input: &Path, frames: u32, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let media = MediaFile::open(input)?;
    let metadata = media.metadata().clone();
    media.release();

    let sampler = FrameSampler::new(metadata.duration, frames)?;
    let delay_ms = sampler.display_duration().as_secs_f64() * 1000.0;

    if json {
        let offsets: Vec<f64> = sampler
            .requests()
            .map(|request| request.target_offset.as_secs_f64())
            .collect();
        let payload = json!({
            "duration_seconds": metadata.duration.as_secs_f64(),
            "frames": frames,
            "delay_ms": delay_ms,
            "offsets_seconds": offsets,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} frames over {:.3}s, {:.1} ms each",
            frames,
            metadata.duration.as_secs_f64(),
            delay_ms
        );
        for request in sampler.requests() {
            println!(
                "  #{:<4} {:>9.3}s",
                request.sequence_index,
                request.target_offset.as_secs_f64()
            );
        }
    }
    Ok(())
}

fn probe(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let media = MediaFile::open(input)?;
    let metadata = media.metadata().clone();
    media.release();

    if json {
        let payload = json!({
            "width": metadata.width,
            "height": metadata.height,
            "duration_seconds": metadata.duration.as_secs_f64(),
            "fps": metadata.frames_per_second,
            "codec": metadata.codec,
            "media_type": VideoInput::open(input).media_type(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "Video: {}x{} @ {:.2} fps [{}]",
            metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
        );
        println!("Duration: {:?}", metadata.duration);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Some(level) = cli.global.log_level {
        clip2gif::set_ffmpeg_log_level(level);
        if cli.global.verbose {
            eprintln!("{} {level}", "ffmpeg log level:".dimmed());
        }
    }

    match cli.command {
        Commands::Convert {
            input,
            out,
            frames,
            quality,
            workers,
            loop_count,
            media_type,
            progress,
            overwrite,
            json,
        } => convert(
            &cli.global,
            input,
            out,
            frames,
            quality,
            workers,
            loop_count,
            media_type,
            progress,
            overwrite,
            json,
        ),
        Commands::Plan {
            input,
            frames,
            json,
        } => plan(&input, frames, json),
        Commands::Probe { input, json } => probe(&input, json),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "clip2gif", &mut io::stdout());
            Ok(())
        }
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
