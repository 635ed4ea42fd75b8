use super::PresentationSink;
use crate::error::PipelineError;
use crate::Frame;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Reports progress through tracing events.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogPresenter;

impl PresentationSink for LogPresenter {
    fn frame_ready(&self, pair: usize, index: usize, frame: &Frame) -> Result<()> {
        tracing::debug!(
            pair,
            index,
            "frame ready ({}x{})",
            frame.width(),
            frame.height()
        );
        Ok(())
    }

    fn finished(&self, outcome: Result<&Path, &PipelineError>) {
        match outcome {
            Ok(path) => tracing::info!("Video written to {}", path.display()),
            Err(err) => tracing::error!("Run failed: {err}"),
        }
    }
}

/// Writes every previewed frame to a directory as `pair{PP}_frame{FF}.png`.
pub struct PreviewDirectory {
    dir: PathBuf,
}

impl PreviewDirectory {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create preview directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn frame_path(&self, pair: usize, index: usize) -> PathBuf {
        self.dir.join(format!("pair{pair:02}_frame{index:02}.png"))
    }
}

impl PresentationSink for PreviewDirectory {
    fn frame_ready(&self, pair: usize, index: usize, frame: &Frame) -> Result<()> {
        let path = self.frame_path(pair, index);
        frame
            .save(&path)
            .with_context(|| format!("Failed to write preview {}", path.display()))
    }

    fn finished(&self, _outcome: Result<&Path, &PipelineError>) {}
}

/// Forwards every event to each contained sink.
#[derive(Default)]
pub struct PresenterSet {
    sinks: Vec<Box<dyn PresentationSink>>,
}

impl PresenterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl PresentationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl PresentationSink for PresenterSet {
    fn frame_ready(&self, pair: usize, index: usize, frame: &Frame) -> Result<()> {
        // Every sink sees the frame even if an earlier one failed.
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(err) = sink.frame_ready(pair, index, frame) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn finished(&self, outcome: Result<&Path, &PipelineError>) {
        for sink in &self.sinks {
            sink.finished(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    #[test]
    fn preview_directory_writes_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let preview = PreviewDirectory::new(dir.path().join("preview")).unwrap();
        let frame: Frame = Arc::new(RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255])));

        preview.frame_ready(2, 5, &frame).unwrap();

        let path = preview.frame_path(2, 5);
        assert!(path.ends_with("pair02_frame05.png"));
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded, *frame);
    }

    #[test]
    fn presenter_set_reaches_every_sink() {
        let dir = tempfile::tempdir().unwrap();
        let set = PresenterSet::new()
            .with(LogPresenter)
            .with(PreviewDirectory::new(dir.path()).unwrap());
        let frame: Frame = Arc::new(RgbaImage::new(2, 2));
        set.frame_ready(0, 0, &frame).unwrap();
        set.finished(Ok(Path::new("final_video.mp4")));
        assert!(dir.path().join("pair00_frame00.png").exists());
    }
}
