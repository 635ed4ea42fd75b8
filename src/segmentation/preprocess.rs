use crate::imaging::Mask;
use anyhow::{ensure, Result};
use image::{imageops, GrayImage, Luma, RgbaImage};
use ndarray::Array4;

/// Converts photos into model input tensors and model output back into masks.
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGBA photo into a normalized NCHW tensor.
    ///
    /// The photo is resized to the model resolution, alpha is dropped and
    /// channels are scaled to [0, 1].
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, image: &RgbaImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Lanczos3,
            )
        } else {
            image.clone()
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = f32::from(pixel[c]) / 255.0;
            }
        }
        tensor
    }

    /// Turn a flattened matte at model resolution into a [`Mask`].
    ///
    /// The mask keeps the model resolution; it is rescaled when applied.
    pub fn postprocess_matte(matte: &[f32], matte_width: u32, matte_height: u32) -> Result<Mask> {
        let _span = tracing::debug_span!("postprocess").entered();
        ensure!(
            matte.len() == (matte_width as usize) * (matte_height as usize),
            "matte has {} values, expected {}x{}",
            matte.len(),
            matte_width,
            matte_height
        );

        let gray = GrayImage::from_fn(matte_width, matte_height, |x, y| {
            let idx = (y * matte_width + x) as usize;
            Luma([(matte[idx] * 255.0).round().clamp(0.0, 255.0) as u8])
        });
        Ok(Mask::new(gray))
    }
}
