use anyhow::{Context, Result};
use clap::Parser;
use cutcut::config::{EncoderSettings, OutputTarget, PipelineConfig, SegmentationTarget};
use cutcut::output::{FfmpegEncoder, LogPresenter, PresenterSet, PreviewDirectory};
use cutcut::pipeline::Orchestrator;
use cutcut::segmentation;
use cutcut::source::{DirectorySource, FileListSource, PhotoSource};
use cutcut::strategy::{Strategy, StrategyTable};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// A directory of photos, or the photo files in timeline order
    #[arg(required = true)]
    photos: Vec<PathBuf>,

    /// Audio track muxed under the video
    #[arg(short, long)]
    audio: PathBuf,

    /// Directory receiving scratch_video.mp4 and final_video.mp4
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Path to segmentation model (ONNX file)
    /// If not provided, the border-key heuristic is used
    #[arg(long)]
    model: Option<PathBuf>,

    /// Segment the later photo of each pair instead of the earlier one
    #[arg(long)]
    segment_next: bool,

    /// Cut per pair, comma separated; pairs past the list use `default`
    #[arg(long, value_enum, value_delimiter = ',')]
    strategies: Option<Vec<Strategy>>,

    /// Cut for pairs past the `--strategies` list
    #[arg(long, value_enum, default_value_t = Strategy::Default)]
    fallback: Strategy,

    /// Maximum number of pairs processed concurrently
    #[arg(long)]
    threads: Option<usize>,

    /// Output width (defaults to the first photo's)
    #[arg(long)]
    width: Option<u32>,

    /// Output height (defaults to the first photo's)
    #[arg(long)]
    height: Option<u32>,

    /// Write every frame as PNG into this directory
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("cutcut starting");

    let source: Box<dyn PhotoSource> = match args.photos.as_slice() {
        [dir] if dir.is_dir() => Box::new(DirectorySource::new(dir)),
        files => Box::new(FileListSource::new(files.to_vec())),
    };
    let photos = source.load().context("Failed to load photos")?;

    let model = segmentation::create_model(args.model.as_deref())
        .context("Failed to load segmentation model")?;
    let (input_w, input_h) = model.input_size();
    tracing::info!("Segmentation: {} at {}x{}", model.name(), input_w, input_h);

    let strategies = match args.strategies {
        Some(list) => StrategyTable::new(list),
        None => StrategyTable::reference(),
    }
    .with_fallback(args.fallback);
    let cuts: Vec<&str> = strategies.assignments().iter().map(|s| s.name()).collect();
    tracing::info!("Cuts: [{}], then {}", cuts.join(", "), strategies.fallback());
    tracing::info!(
        "Expecting {} frames from {} photos",
        strategies.expected_timeline_len(photos.len()),
        photos.len()
    );

    let config = PipelineConfig {
        strategies,
        max_parallel: args.threads,
        segmentation_target: if args.segment_next {
            SegmentationTarget::Next
        } else {
            SegmentationTarget::Current
        },
    };

    let mut presenters = PresenterSet::new().with(LogPresenter);
    if let Some(dir) = &args.preview_dir {
        presenters = presenters.with(PreviewDirectory::new(dir)?);
    }

    let encoder = FfmpegEncoder::new(EncoderSettings {
        width: args.width,
        height: args.height,
        ffmpeg: args.ffmpeg,
        ..EncoderSettings::default()
    });

    let orchestrator = Orchestrator::new(Arc::from(model), Arc::new(presenters), config);
    let target = OutputTarget::new(&args.output_dir);

    let started = Instant::now();
    let video = orchestrator
        .render_video(&photos, &encoder, &args.audio, &target)
        .context("Failed to render video")?;

    tracing::info!(
        "Done in {:.1}s: {}",
        started.elapsed().as_secs_f64(),
        video.display()
    );
    Ok(())
}
