mod border_key;
#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
mod preprocess;
pub mod types;

pub use border_key::BorderKeySegmenter;
#[cfg(feature = "onnx")]
pub use onnx::OnnxSegmenter;
#[cfg(feature = "onnx")]
pub use preprocess::Preprocessor;
pub use types::SegmentationModel;

use anyhow::Result;
use std::path::Path;

/// Create the segmentation model for a run.
///
/// With a model path the ONNX backend is used; without one the built-in
/// border-key heuristic stands in.
pub fn create_model(model_path: Option<&Path>) -> Result<Box<dyn SegmentationModel>> {
    match model_path {
        Some(path) => load_onnx(path),
        None => {
            tracing::info!("No model given, using border-key segmentation");
            Ok(Box::new(BorderKeySegmenter::default()))
        }
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Box<dyn SegmentationModel>> {
    Ok(Box::new(OnnxSegmenter::new(path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Box<dyn SegmentationModel>> {
    anyhow::bail!(
        "cannot load {}: built without the `onnx` feature",
        path.display()
    )
}
