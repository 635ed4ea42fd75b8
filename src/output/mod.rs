mod ffmpeg;
mod preview;

pub use ffmpeg::{is_ffmpeg_available, letterbox, FfmpegEncoder};
pub use preview::{LogPresenter, PresenterSet, PreviewDirectory};

use crate::config::OutputTarget;
use crate::error::{EncodingError, PipelineError};
use crate::Frame;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Trait for video encoders.
///
/// Frames must come out in the order they go in, one video frame each, and
/// the audio asset is muxed underneath. Returns the path of the playable file.
pub trait VideoEncoder: Send + Sync {
    fn encode(
        &self,
        frames: &[Frame],
        audio: &Path,
        target: &OutputTarget,
    ) -> Result<PathBuf, EncodingError>;
}

/// Trait for presentation layers watching a run.
pub trait PresentationSink: Send + Sync {
    /// A frame of `pair` became available, `index` being its position within
    /// the pair. Called from worker threads in no particular pair order.
    fn frame_ready(&self, pair: usize, index: usize, frame: &Frame) -> Result<()>;

    /// Terminal signal, sent exactly once per run.
    fn finished(&self, outcome: Result<&Path, &PipelineError>);
}
