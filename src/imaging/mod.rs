//! Stateless pixel and geometry primitives the cut strategies are built from.
//!
//! Every operation takes straight-alpha RGBA8 rasters and returns a fresh
//! raster; nothing is mutated in place, so the same photo can be shared by
//! any number of concurrent strategy invocations.

mod blend;
mod composite;
mod edge;
mod stroke;
mod transform;

pub use composite::{
    draw_onto, inverted_background, masked_composite, needs_background_rescale, placement,
    remove_background, remove_foreground, Offset, CRITICAL_SCALE_DIFFERENCE,
};
pub use edge::{composite_addition_mask, edge_mask, edge_mask_with_radius, EDGE_RADIUS};
pub use stroke::{apply_stroke, apply_stroke_with, fill_silhouette, stroked_extent};
pub use transform::{
    center_crop, crop_rect, crop_to_opaque_bounds, fit_within, scale, scale_with_aspect,
    spawn_crop_to_opaque_bounds,
};

use crate::error::ImagingError;
use image::{imageops, GrayImage, Luma, RgbaImage};
use std::borrow::Cow;

/// Filter used whenever a photo or stamp is resampled.
pub const RESAMPLE_FILTER: imageops::FilterType = imageops::FilterType::Lanczos3;

/// Filter used for masks; a bilinear kernel avoids ringing around hard mask edges.
const MASK_FILTER: imageops::FilterType = imageops::FilterType::Triangle;

/// Per-pixel foreground weight map: 0 = background, 255 = foreground.
///
/// A mask carries its own resolution, which usually differs from the photo it
/// is applied to. Consumers call [`Mask::fitted_to`] to rescale it with
/// independent X/Y factors before sampling.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask(GrayImage);

impl Mask {
    pub fn new(gray: GrayImage) -> Self {
        Self(gray)
    }

    /// Build a mask from a weight function returning values in `[0, 1]`.
    pub fn from_fn(width: u32, height: u32, weight: impl Fn(u32, u32) -> f32) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            Luma([to_u8(weight(x, y))])
        }))
    }

    /// Interpret the red channel of an RGBA raster as a mask.
    ///
    /// Red is weighted by alpha so transparent pixels never contribute.
    pub fn from_red_channel(image: &RgbaImage) -> Self {
        Self(GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let p = image.get_pixel(x, y);
            let weighted = u16::from(p[0]) * u16::from(p[3]) / 255;
            Luma([weighted as u8])
        }))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.0.width() == 0 || self.0.height() == 0
    }

    /// Foreground weight at `(x, y)`, normalized to `[0, 1]`.
    pub fn weight(&self, x: u32, y: u32) -> f32 {
        f32::from(self.0.get_pixel(x, y)[0]) / 255.0
    }

    /// Rescale to exactly `width` x `height`. Borrows when already matching.
    pub fn fitted_to(&self, width: u32, height: u32) -> Cow<'_, Mask> {
        if self.dimensions() == (width, height) {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(Self(imageops::resize(&self.0, width, height, MASK_FILTER)))
        }
    }

    pub fn inverted(&self) -> Mask {
        let mut gray = self.0.clone();
        imageops::invert(&mut gray);
        Self(gray)
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

}

pub(crate) fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn ensure_raster(image: &RgbaImage, what: &'static str) -> Result<(), ImagingError> {
    if image.width() == 0 || image.height() == 0 {
        Err(ImagingError::MissingRasterData(what))
    } else {
        Ok(())
    }
}

pub(crate) fn ensure_mask(mask: &Mask, what: &'static str) -> Result<(), ImagingError> {
    if mask.is_empty() {
        Err(ImagingError::MissingRasterData(what))
    } else {
        Ok(())
    }
}
