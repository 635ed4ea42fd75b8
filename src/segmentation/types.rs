use crate::imaging::Mask;
use anyhow::Result;
use image::RgbaImage;

/// Trait for segmentation models.
///
/// A model maps a photo to a foreground weight mask. The mask may come back
/// at any resolution; consumers rescale it to whatever image they apply it to.
/// Models are shared by every pair task of a run, hence `Send + Sync`.
pub trait SegmentationModel: Send + Sync {
    /// Compute the foreground mask for `photo`.
    fn segment(&self, photo: &RgbaImage) -> Result<Mask>;

    /// Resolution the model analyses photos at, as (width, height).
    fn input_size(&self) -> (u32, u32);

    /// Short name used in logs.
    fn name(&self) -> &str {
        "segmentation"
    }
}

