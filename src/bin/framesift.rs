use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use framesift::{
    ExtractOptions, ExtractionProgress, FfmpegLogLevel, FrameSampler, ProgressCallback,
    set_ffmpeg_log_level,
};

const CLI_AFTER_HELP: &str = "Examples:\n  framesift extract input.mp4 --out frames --interval 2 --progress\n  framesift extract input.mp4 --out frames --quality 80 --max-width 768 --json\n  framesift metadata input.mp4 --json\n  framesift completions zsh > _framesift";

#[derive(Debug, Parser)]
#[command(
    name = "framesift",
    version,
    about = "Extract still frames from video at regular intervals",
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
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract frames at regular time intervals to an output directory.
    #[command(
        about = "Extract frames at regular intervals",
        after_help = "Examples:\n  framesift extract input.mp4 --out frames\n  framesift extract input.mp4 --out frames --interval 0.5 --quality 95 --progress"
    )]
    Extract {
        /// Input media path or URL.
        input: String,

        /// Output directory for extracted frame images.
        #[arg(long)]
        out: PathBuf,

        /// Seconds between extracted frames.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,

        /// JPEG quality for output blobs (1-100).
        #[arg(long, default_value_t = 90)]
        quality: u8,

        /// Bound on output frame width.
        #[arg(long, default_value_t = 1024)]
        max_width: u32,

        /// Bound on output frame height.
        #[arg(long, default_value_t = 1024)]
        max_height: u32,

        /// Print a machine-readable JSON summary.
        #[arg(long)]
        json: bool,
    },

    /// Print metadata for a media file (alias: probe).
    #[command(
        about = "Print source metadata",
        visible_alias = "probe",
        after_help = "Examples:\n  framesift metadata input.mp4\n  framesift metadata input.mp4 --json"
    )]
    Metadata {
        /// Input media path or URL.
        input: String,

        /// Output metadata as machine-readable JSON.
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

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "panic" => Some(FfmpegLogLevel::Panic),
        "fatal" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" => Some(FfmpegLogLevel::Warning),
        "info" => Some(FfmpegLogLevel::Info),
        "verbose" => Some(FfmpegLogLevel::Verbose),
        "debug" => Some(FfmpegLogLevel::Debug),
        "trace" => Some(FfmpegLogLevel::Trace),
        _ => None,
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    match &global.log_level {
        Some(value) => {
            let level = parse_log_level(value)
                .ok_or_else(|| format!("unknown FFmpeg log level: {value}"))?;
            set_ffmpeg_log_level(level);
        }
        // Decoder chatter during mid-stream seeks is expected; keep it down.
        None => set_ffmpeg_log_level(FfmpegLogLevel::Error),
    }
    Ok(())
}

/// Drives an indicatif bar from pipeline progress events.
struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, progress: &ExtractionProgress) {
        match &progress.status {
            Some(status) => self.bar.set_message(status.clone()),
            None => self.bar.set_position(progress.frames_extracted),
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Extract {
            input,
            out,
            interval,
            quality,
            max_width,
            max_height,
            json,
        } => {
            if interval <= 0.0 {
                return Err("--interval must be greater than 0".into());
            }

            if out.exists() {
                if !cli.global.overwrite {
                    return Err(format!(
                        "output directory already exists: {} (use --overwrite)",
                        out.display()
                    )
                    .into());
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("writing into existing directory {}", out.display()).yellow()
                );
            }
            fs::create_dir_all(&out)?;

            let mut options = ExtractOptions::new()
                .with_quality(quality)
                .with_max_dimensions(max_width, max_height)
                .with_frame_interval(Duration::from_secs_f64(interval));

            // The bar length is unknown until the source is probed; start
            // at zero and fix it up once metadata is available.
            let progress_bar = if cli.global.progress {
                let bar = ProgressBar::new(0);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                bar.set_style(style.progress_chars("##-"));
                options = options.with_progress(Arc::new(BarProgress { bar: bar.clone() }));
                Some(bar)
            } else {
                None
            };

            let sampler = FrameSampler::open(&input, options)?;
            let metadata = sampler.metadata().clone();
            if let Some(bar) = &progress_bar {
                bar.set_length((metadata.duration.as_secs_f64() / interval).floor() as u64);
            }

            let frames = sampler.extract()?;

            if let Some(bar) = progress_bar {
                bar.finish_with_message("done");
            }

            let mut written = Vec::with_capacity(frames.len());
            for (index, frame) in frames.iter().enumerate() {
                let Some(blob) = &frame.blob else {
                    continue;
                };
                let output_path = out.join(format!("frame_{index:05}.jpg"));
                if output_path.exists() && !cli.global.overwrite {
                    return Err(format!(
                        "output file already exists: {} (use --overwrite)",
                        output_path.display()
                    )
                    .into());
                }
                fs::write(&output_path, blob)?;
                if cli.global.verbose {
                    eprintln!(
                        "saved frame {index} ({:.3}s) -> {}",
                        frame.timestamp.as_secs_f64(),
                        output_path.display()
                    );
                }
                written.push((index, frame.timestamp, output_path));
            }

            if json {
                let payload = json!({
                    "source": input,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "interval_seconds": interval,
                    "frames": written.iter().map(|(index, timestamp, path)| json!({
                        "index": index,
                        "timestamp_seconds": timestamp.as_secs_f64(),
                        "file": path.display().to_string(),
                    })).collect::<Vec<_>>(),
                    "count": written.len(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Extracted {} frame(s) to {}", written.len(), out.display()).green()
                );
            }
        }
        Commands::Metadata { input, json } => {
            let sampler = FrameSampler::open(&input, ExtractOptions::new())?;
            let metadata = sampler.metadata();
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "codec": metadata.codec,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesift", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_log_level;

    #[test]
    fn parse_log_level_aliases() {
        assert!(parse_log_level("quiet").is_some());
        assert!(parse_log_level("ERROR").is_some());
        assert!(parse_log_level("Warning").is_some());
        assert!(parse_log_level("chatty").is_none());
    }
}
