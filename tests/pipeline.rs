use cutcut::config::{OutputTarget, PipelineConfig, SegmentationTarget};
use cutcut::error::{EncodingError, PipelineError};
use cutcut::imaging::Mask;
use cutcut::output::{PresentationSink, VideoEncoder};
use cutcut::pipeline::{assemble, Orchestrator};
use cutcut::segmentation::SegmentationModel;
use cutcut::strategy::StrategyTable;
use cutcut::{Frame, Photo};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const W: u32 = 48;
const H: u32 = 36;

/// Photo `index` carries its index in the red channel of pixel (0, 0).
fn photo(index: u8) -> Photo {
    Arc::new(RgbaImage::from_fn(W, H, |x, y| {
        if (x, y) == (0, 0) {
            Rgba([index, 0, 0, 255])
        } else if x > W / 3 && x < 2 * W / 3 && y > H / 4 && y < 3 * H / 4 {
            Rgba([230, 200, index.wrapping_mul(25), 255])
        } else {
            Rgba([index.wrapping_mul(25), (x * 5) as u8, (y * 7) as u8, 255])
        }
    }))
}

fn photos(n: u8) -> Vec<Photo> {
    (0..n).map(photo).collect()
}

fn tag(photo: &RgbaImage) -> u8 {
    photo.get_pixel(0, 0)[0]
}

/// Returns a half-resolution subject mask after a delay derived from the
/// photo and a seed, so completion order changes from seed to seed.
struct ScriptedSegmenter {
    seed: u64,
    fail_on: Vec<u8>,
    seen: Mutex<Vec<u8>>,
}

impl ScriptedSegmenter {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            fail_on: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, tags: &[u8]) -> Self {
        self.fail_on = tags.to_vec();
        self
    }

    fn seen(&self) -> Vec<u8> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort_unstable();
        seen
    }
}

impl SegmentationModel for ScriptedSegmenter {
    fn segment(&self, photo: &RgbaImage) -> anyhow::Result<Mask> {
        let tag = tag(photo);
        self.seen.lock().unwrap().push(tag);

        let delay = (u64::from(tag) * 7919 + self.seed * 104_729) % 17;
        std::thread::sleep(Duration::from_millis(delay));

        anyhow::ensure!(!self.fail_on.contains(&tag), "no subject found in photo {tag}");
        let (w, h) = (photo.width() / 2, photo.height() / 2);
        Ok(Mask::from_fn(w, h, |x, y| {
            let inside = x > w / 3 && x < 2 * w / 3 && y > h / 4 && y < 3 * h / 4;
            if inside {
                1.0
            } else {
                0.0
            }
        }))
    }

    fn input_size(&self) -> (u32, u32) {
        (W / 2, H / 2)
    }
}

#[derive(Default)]
struct RecordingPresenter {
    frames: Mutex<Vec<(usize, usize)>>,
    outcomes: Mutex<Vec<Result<PathBuf, String>>>,
}

impl PresentationSink for RecordingPresenter {
    fn frame_ready(&self, pair: usize, index: usize, _frame: &Frame) -> anyhow::Result<()> {
        self.frames.lock().unwrap().push((pair, index));
        Ok(())
    }

    fn finished(&self, outcome: Result<&Path, &PipelineError>) {
        self.outcomes
            .lock()
            .unwrap()
            .push(outcome.map(Path::to_path_buf).map_err(|e| e.to_string()));
    }
}

/// Keeps the frames it is given and writes a placeholder deliverable, or
/// fails after writing it when `fail` is set.
#[derive(Default)]
struct RecordingEncoder {
    frames: Mutex<Vec<Frame>>,
    fail: bool,
}

impl VideoEncoder for RecordingEncoder {
    fn encode(
        &self,
        frames: &[Frame],
        _audio: &Path,
        target: &OutputTarget,
    ) -> Result<PathBuf, EncodingError> {
        self.frames.lock().unwrap().extend_from_slice(frames);
        let path = target.final_path();
        std::fs::write(&path, b"video").map_err(|e| EncodingError::video(e.to_string()))?;
        if self.fail {
            return Err(EncodingError::export("mux failed"));
        }
        Ok(path)
    }
}

fn orchestrator(
    model: Arc<ScriptedSegmenter>,
    presenter: Arc<RecordingPresenter>,
    config: PipelineConfig,
) -> Orchestrator {
    Orchestrator::new(model, presenter, config)
}

fn timeline(seed: u64, max_parallel: Option<usize>) -> Vec<Frame> {
    let config = PipelineConfig {
        max_parallel,
        ..PipelineConfig::default()
    };
    let store = orchestrator(
        Arc::new(ScriptedSegmenter::new(seed)),
        Arc::new(RecordingPresenter::default()),
        config,
    )
    .run_all(&photos(9))
    .unwrap();
    assemble(&store).unwrap()
}

#[test]
fn nine_photos_build_thirty_three_frames_ending_on_last_photo() {
    let input = photos(9);
    let model = Arc::new(ScriptedSegmenter::new(1));
    let store = orchestrator(
        Arc::clone(&model),
        Arc::new(RecordingPresenter::default()),
        PipelineConfig::default(),
    )
    .run_all(&input)
    .unwrap();
    assert_eq!(store.len(), 8);

    let frames = assemble(&store).unwrap();
    assert_eq!(frames.len(), StrategyTable::reference().expected_timeline_len(9));
    assert_eq!(frames.len(), 33);
    assert_eq!(*frames[32], *input[8]);
    assert_eq!(*frames[0], *input[0]);
    assert_eq!(model.seen(), (0..8).collect::<Vec<u8>>());
}

#[test]
fn completion_order_does_not_change_the_timeline() {
    let reference = timeline(1, None);
    for (seed, max_parallel) in [(2, None), (3, None), (4, Some(1)), (5, Some(3))] {
        let other = timeline(seed, max_parallel);
        assert_eq!(other.len(), reference.len());
        assert!(
            reference.iter().zip(&other).all(|(a, b)| **a == **b),
            "seed {seed} produced a different timeline"
        );
    }
}

#[test]
fn each_pair_starts_with_its_current_photo() {
    let input = photos(9);
    let frames = timeline(7, None);
    let table = StrategyTable::reference();

    let mut at = 0;
    for pair in 0..8 {
        assert_eq!(*frames[at], *input[pair], "pair {pair}");
        at += 1 + table.select(pair).frame_count();
    }
    assert_eq!(at, 32);
}

#[test]
fn segmentation_failure_aborts_the_run() {
    let model = Arc::new(ScriptedSegmenter::new(3).failing_on(&[5, 3]));
    let err = orchestrator(
        model,
        Arc::new(RecordingPresenter::default()),
        PipelineConfig::default(),
    )
    .run_all(&photos(9))
    .unwrap_err();

    match err {
        PipelineError::Segmentation { pair, source } => {
            assert_eq!(pair, 3);
            assert!(source.to_string().contains("photo 3"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn segment_next_feeds_the_later_photo() {
    let model = Arc::new(ScriptedSegmenter::new(9));
    let config = PipelineConfig {
        segmentation_target: SegmentationTarget::Next,
        ..PipelineConfig::default()
    };
    orchestrator(
        Arc::clone(&model),
        Arc::new(RecordingPresenter::default()),
        config,
    )
    .run_all(&photos(4))
    .unwrap();
    assert_eq!(model.seen(), vec![1, 2, 3]);
}

#[test]
fn render_video_hands_the_timeline_to_the_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let target = OutputTarget::new(dir.path().join("out"));
    let presenter = Arc::new(RecordingPresenter::default());
    let encoder = RecordingEncoder::default();

    let video = orchestrator(
        Arc::new(ScriptedSegmenter::new(5)),
        Arc::clone(&presenter),
        PipelineConfig::default(),
    )
    .render_video(&photos(9), &encoder, Path::new("track.m4a"), &target)
    .unwrap();

    assert_eq!(video, target.final_path());
    assert!(video.exists());

    let encoded = encoder.frames.lock().unwrap();
    assert_eq!(encoded.len(), 33);
    assert_eq!(tag(&encoded[32]), 8);

    // Every frame was previewed, including the closing photo.
    let mut previewed = presenter.frames.lock().unwrap().clone();
    previewed.sort_unstable();
    assert_eq!(previewed.len(), 33);
    assert_eq!(previewed.last(), Some(&(7, 3)));

    let outcomes = presenter.outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());
}

#[test]
fn failed_encoding_leaves_no_playable_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = OutputTarget::new(dir.path());
    let presenter = Arc::new(RecordingPresenter::default());
    let encoder = RecordingEncoder {
        fail: true,
        ..RecordingEncoder::default()
    };

    let err = orchestrator(
        Arc::new(ScriptedSegmenter::new(6)),
        Arc::clone(&presenter),
        PipelineConfig::default(),
    )
    .render_video(&photos(3), &encoder, Path::new("track.m4a"), &target)
    .unwrap_err();

    assert!(matches!(err, PipelineError::Encoding(EncodingError::Export(_))));
    assert!(!target.final_path().exists());

    let outcomes = presenter.outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].as_ref().unwrap_err().contains("mux failed"));
}

#[test]
fn segmentation_failure_never_reaches_the_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let target = OutputTarget::new(dir.path());
    let encoder = RecordingEncoder::default();
    let presenter = Arc::new(RecordingPresenter::default());

    let result = orchestrator(
        Arc::new(ScriptedSegmenter::new(8).failing_on(&[0])),
        Arc::clone(&presenter),
        PipelineConfig::default(),
    )
    .render_video(&photos(3), &encoder, Path::new("track.m4a"), &target);

    assert!(matches!(result, Err(PipelineError::Segmentation { pair: 0, .. })));
    assert!(encoder.frames.lock().unwrap().is_empty());
    assert_eq!(presenter.outcomes.lock().unwrap().len(), 1);
}
