use super::preprocess::Preprocessor;
use super::SegmentationModel;
use crate::imaging::Mask;
use anyhow::{anyhow, ensure, Context, Result};
use image::RgbaImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;

/// Single-image portrait matting model loaded through ONNX Runtime.
///
/// Expects one `[1, 3, H, W]` input in [0, 1] and reads the first output as
/// a `[1, 1, H, W]` alpha matte.
pub struct OnnxSegmenter {
    // `Session::run` needs exclusive access; pair tasks take turns.
    session: Mutex<Session>,
    preprocessor: Preprocessor,
    width: u32,
    height: u32,
}

impl OnnxSegmenter {
    /// Load a model with the default 512x512 input resolution.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::with_input_size(model_path, 512, 512)
    }

    pub fn with_input_size<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let path = model_path.as_ref();
        tracing::info!("Loading segmentation model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("Segmentation model loaded ({}x{})", width, height);

        Ok(Self {
            session: Mutex::new(session),
            preprocessor: Preprocessor::new(width, height),
            width,
            height,
        })
    }
}

impl SegmentationModel for OnnxSegmenter {
    fn segment(&self, photo: &RgbaImage) -> Result<Mask> {
        let _span = tracing::debug_span!("onnx_segment").entered();
        ensure!(
            photo.width() > 0 && photo.height() > 0,
            "photo has no raster data"
        );

        let input = self.preprocessor.preprocess(photo);
        let shape = [1usize, 3, self.height as usize, self.width as usize];
        let tensor = Tensor::from_array((shape, input.into_raw_vec()))
            .context("Failed to build input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("segmentation session lock poisoned"))?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = session
            .run(ort::inputs![tensor])
            .context("Failed to run inference")?;
        drop(_infer_span);

        let (matte_shape, matte) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to read alpha matte")?;
        ensure!(
            matte_shape.len() == 4,
            "unexpected matte rank {}",
            matte_shape.len()
        );
        let matte_height = matte_shape[2] as u32;
        let matte_width = matte_shape[3] as u32;

        Preprocessor::postprocess_matte(matte, matte_width, matte_height)
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
