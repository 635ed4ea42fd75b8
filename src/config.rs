//! Run configuration shared by the orchestrator, the encoder and the CLI.

use crate::strategy::StrategyTable;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which photo of a pair the segmentation model looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SegmentationTarget {
    /// The earlier photo of the pair.
    #[default]
    Current,
    /// The later photo of the pair, whose subject the cuts extract.
    Next,
}

impl SegmentationTarget {
    /// Index into the photo list of the photo segmented for `pair`.
    pub fn photo_index(self, pair: usize) -> usize {
        match self {
            SegmentationTarget::Current => pair,
            SegmentationTarget::Next => pair + 1,
        }
    }
}

/// Orchestration settings for one run.
#[derive(Clone, Debug, Default)]
pub struct PipelineConfig {
    pub strategies: StrategyTable,
    /// Upper bound on concurrently running pair tasks; `None` means one per pair.
    pub max_parallel: Option<usize>,
    pub segmentation_target: SegmentationTarget,
}

impl PipelineConfig {
    /// Worker count for a run over `pairs` pairs.
    pub fn worker_count(&self, pairs: usize) -> usize {
        let cap = self.max_parallel.unwrap_or(pairs).max(1);
        pairs.clamp(1, cap)
    }
}

/// Rational frame duration in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDuration {
    pub num: u32,
    pub den: u32,
}

impl FrameDuration {
    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Frame rate as an ffmpeg rational, the reciprocal of the duration.
    pub fn rate(self) -> String {
        format!("{}/{}", self.den, self.num)
    }
}

/// Encoder parameters. Defaults reproduce the themed template's timing.
#[derive(Clone, Debug)]
pub struct EncoderSettings {
    pub frame_duration: FrameDuration,
    /// Where in the audio asset playback starts.
    pub audio_offset: Duration,
    /// Output width; defaults to the first frame's width.
    pub width: Option<u32>,
    /// Output height; defaults to the first frame's height.
    pub height: Option<u32>,
    pub ffmpeg: PathBuf,
    pub crf: u8,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            frame_duration: FrameDuration { num: 3, den: 10 },
            audio_offset: Duration::from_millis(500),
            width: None,
            height: None,
            ffmpeg: PathBuf::from("ffmpeg"),
            crf: 18,
        }
    }
}

pub const SCRATCH_VIDEO_NAME: &str = "scratch_video.mp4";
pub const FINAL_VIDEO_NAME: &str = "final_video.mp4";

/// The two well-known output files of a run inside one writable directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTarget {
    dir: PathBuf,
}

impl OutputTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Video-only intermediate file.
    pub fn scratch_path(&self) -> PathBuf {
        self.dir.join(SCRATCH_VIDEO_NAME)
    }

    /// Audio-muxed deliverable.
    pub fn final_path(&self) -> PathBuf {
        self.dir.join(FINAL_VIDEO_NAME)
    }

    /// Create the directory and delete stale output from a previous run.
    pub fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        self.discard()
    }

    /// Remove both files if present.
    pub fn discard(&self) -> std::io::Result<()> {
        for path in [self.scratch_path(), self.final_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!("removed stale {}", path.display()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
