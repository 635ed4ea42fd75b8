//! Concurrent orchestration of a whole run.
//!
//! One task per adjacent photo pair is dispatched onto a dedicated rayon
//! pool. Each task segments its photo, runs the pair's cut and stores the
//! resulting frames in its own [`FrameStore`] slot; the caller blocks on a
//! [`CompletionLatch`] until every task has finished, and the timeline is
//! then rebuilt in pair order by [`assemble`].

mod latch;
mod store;
mod timeline;

pub use latch::{CompletionLatch, LatchGuard};
pub use store::{FrameStore, PairState};
pub use timeline::assemble;

use crate::config::{OutputTarget, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::output::{PresentationSink, VideoEncoder};
use crate::segmentation::SegmentationModel;
use crate::strategy::Strategy;
use crate::{Frame, Photo};
use anyhow::Context;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Orchestrator {
    model: Arc<dyn SegmentationModel>,
    presenter: Arc<dyn PresentationSink>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn SegmentationModel>,
        presenter: Arc<dyn PresentationSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            model,
            presenter,
            config,
        }
    }

    /// Run every pair and block until all of them have finished.
    ///
    /// On success every slot is complete and the last pair ends with the
    /// unmodified last photo. Any segmentation failure fails the whole run;
    /// the reported failure is the one with the lowest PairIndex.
    pub fn run_all(&self, photos: &[Photo]) -> PipelineResult<Arc<FrameStore>> {
        validate(photos)?;
        let pairs = photos.len() - 1;
        let workers = self.config.worker_count(pairs);
        let _span = tracing::info_span!("run_all", photos = photos.len(), workers).entered();
        tracing::info!("Dispatching {} pairs on {} workers", pairs, workers);

        let pool = build_thread_pool(workers)?;
        let photos: Arc<[Photo]> = photos.into();
        let store = Arc::new(FrameStore::new(pairs));
        let latch = Arc::new(CompletionLatch::new(pairs));

        for pair in 0..pairs {
            let task = PairTask {
                pair,
                // Fixed here, before dispatch; tasks never consult the table.
                strategy: self.config.strategies.select(pair),
                segment_index: self.config.segmentation_target.photo_index(pair),
                photos: Arc::clone(&photos),
                store: Arc::clone(&store),
                model: Arc::clone(&self.model),
                presenter: Arc::clone(&self.presenter),
            };
            let guard = latch.guard();
            pool.spawn(move || {
                let _guard = guard;
                task.run();
            });
        }

        tracing::debug!(outstanding = latch.remaining(), "waiting for pair tasks");
        latch.wait();

        if let Some(err) = store.take_first_failure() {
            return Err(err);
        }
        for pair in 0..pairs {
            if store.state(pair)? != PairState::Complete {
                return Err(PipelineError::IncompleteTimeline { pair });
            }
        }

        let last = Arc::clone(&photos[pairs]);
        store.append_terminal(pairs - 1, Arc::clone(&last))?;
        self.notify(pairs - 1, store.frames(pairs - 1)?.len() - 1, &last);
        Ok(store)
    }

    /// Run all pairs, assemble the timeline and encode it.
    ///
    /// The presentation sink receives the terminal outcome exactly once. On
    /// failure no output file is left behind.
    pub fn render_video(
        &self,
        photos: &[Photo],
        encoder: &dyn VideoEncoder,
        audio: &Path,
        target: &OutputTarget,
    ) -> PipelineResult<PathBuf> {
        let outcome = self.render_into(photos, encoder, audio, target);
        if outcome.is_err() {
            if let Err(e) = target.discard() {
                tracing::warn!("failed to clean up {}: {e}", target.dir().display());
            }
        }
        self.presenter
            .finished(outcome.as_ref().map(PathBuf::as_path));
        outcome
    }

    fn render_into(
        &self,
        photos: &[Photo],
        encoder: &dyn VideoEncoder,
        audio: &Path,
        target: &OutputTarget,
    ) -> PipelineResult<PathBuf> {
        target.prepare().with_context(|| {
            format!("failed to prepare output directory {}", target.dir().display())
        })?;

        let store = self.run_all(photos)?;
        let timeline = assemble(&store)?;
        tracing::info!("Timeline has {} frames", timeline.len());

        let _span = tracing::info_span!("encode", frames = timeline.len()).entered();
        Ok(encoder.encode(&timeline, audio, target)?)
    }

    fn notify(&self, pair: usize, index: usize, frame: &Frame) {
        if let Err(err) = self.presenter.frame_ready(pair, index, frame) {
            tracing::warn!(pair, index, "preview failed: {err:#}");
        }
    }
}

/// Everything one pair task owns.
struct PairTask {
    pair: usize,
    strategy: Strategy,
    segment_index: usize,
    photos: Arc<[Photo]>,
    store: Arc<FrameStore>,
    model: Arc<dyn SegmentationModel>,
    presenter: Arc<dyn PresentationSink>,
}

impl PairTask {
    fn run(self) {
        let pair = self.pair;
        let _span =
            tracing::debug_span!("pair", pair, strategy = self.strategy.name()).entered();

        let stored = match self.produce() {
            Ok(frames) => {
                for (index, frame) in frames.iter().enumerate() {
                    if let Err(err) = self.presenter.frame_ready(pair, index, frame) {
                        tracing::warn!(pair, index, "preview failed: {err:#}");
                    }
                }
                tracing::debug!(frames = frames.len(), "pair complete");
                self.store.complete(pair, frames)
            }
            Err(err) => {
                tracing::error!("{err}");
                self.store.fail(pair, err)
            }
        };
        if let Err(err) = stored {
            tracing::error!("{err}");
        }
    }

    /// `[current photo, cut frames...]` for this pair.
    fn produce(&self) -> PipelineResult<Vec<Frame>> {
        let pair = self.pair;
        let current = &self.photos[pair];
        let next = &self.photos[pair + 1];

        self.store.advance(pair, PairState::SegmentationRunning)?;
        let mask = {
            let _span = tracing::debug_span!("segment", model = self.model.name()).entered();
            self.model
                .segment(&self.photos[self.segment_index])
                .map_err(|source| PipelineError::Segmentation { pair, source })?
        };

        self.store.advance(pair, PairState::StrategyRunning)?;
        let cut = self.strategy.produce_frames(current, next, &mask);

        let mut frames = Vec::with_capacity(1 + cut.len());
        frames.push(Arc::clone(current));
        frames.extend(cut.into_iter().map(Arc::new));
        Ok(frames)
    }
}

fn validate(photos: &[Photo]) -> PipelineResult<()> {
    if photos.len() < 2 {
        return Err(PipelineError::validation(format!(
            "need at least 2 photos, got {}",
            photos.len()
        )));
    }
    if let Some(index) = photos
        .iter()
        .position(|p| p.width() == 0 || p.height() == 0)
    {
        return Err(PipelineError::validation(format!(
            "photo {index} has no raster data"
        )));
    }
    Ok(())
}

fn build_thread_pool(threads: usize) -> PipelineResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("cutcut-pair-{i}"))
        .panic_handler(|payload| {
            tracing::error!("pair task panicked: {}", panic_message(payload.as_ref()));
        })
        .build()
        .map_err(|e| PipelineError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Mask;
    use crate::output::LogPresenter;
    use crate::strategy::StrategyTable;
    use image::{Rgba, RgbaImage};

    struct FullMask;

    impl SegmentationModel for FullMask {
        fn segment(&self, photo: &RgbaImage) -> anyhow::Result<Mask> {
            Ok(Mask::from_fn(photo.width(), photo.height(), |_, _| 1.0))
        }

        fn input_size(&self) -> (u32, u32) {
            (0, 0)
        }
    }

    struct Panicking;

    impl SegmentationModel for Panicking {
        fn segment(&self, _photo: &RgbaImage) -> anyhow::Result<Mask> {
            panic!("model crashed");
        }

        fn input_size(&self) -> (u32, u32) {
            (0, 0)
        }
    }

    fn photos(n: u8) -> Vec<Photo> {
        (0..n)
            .map(|i| Arc::new(RgbaImage::from_pixel(8, 6, Rgba([i * 20, 0, 0, 255]))))
            .collect()
    }

    fn orchestrator(model: impl SegmentationModel + 'static) -> Orchestrator {
        let config = PipelineConfig {
            strategies: StrategyTable::new(Vec::new()),
            ..PipelineConfig::default()
        };
        Orchestrator::new(Arc::new(model), Arc::new(LogPresenter), config)
    }

    #[test]
    fn rejects_fewer_than_two_photos() {
        let err = orchestrator(FullMask).run_all(&photos(1)).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn rejects_photo_without_raster() {
        let mut input = photos(3);
        input[1] = Arc::new(RgbaImage::new(0, 4));
        let err = orchestrator(FullMask).run_all(&input).unwrap_err();
        assert!(err.to_string().contains("photo 1"));
    }

    #[test]
    fn default_cuts_with_full_mask_reveal_next_photo() {
        let input = photos(3);
        let store = orchestrator(FullMask).run_all(&input).unwrap();
        let timeline = assemble(&store).unwrap();
        // [p0, cut] [p1, cut, p2]
        assert_eq!(timeline.len(), 5);
        assert!(Arc::ptr_eq(&timeline[0], &input[0]));
        assert_eq!(*timeline[1], *input[1]);
        assert!(Arc::ptr_eq(&timeline[2], &input[1]));
        assert!(Arc::ptr_eq(&timeline[4], &input[2]));
    }

    #[test]
    fn panicking_task_is_reported_not_hung() {
        let err = orchestrator(Panicking).run_all(&photos(3)).unwrap_err();
        assert!(matches!(err, PipelineError::IncompleteTimeline { pair: 0 }));
    }

    #[test]
    fn panic_payloads_are_readable() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
    }
}
