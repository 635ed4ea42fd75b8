use super::blend::{blit, BlendMode};
use super::{ensure_raster, RESAMPLE_FILTER};
use crate::error::ImagingError;
use crossbeam_channel::{bounded, Receiver};
use image::{imageops, Rgba, RgbaImage};
use std::borrow::Cow;
use std::sync::Arc;

/// Resize to exactly `width` x `height`, borrowing when nothing changes.
pub(crate) fn stretched_to(image: &RgbaImage, width: u32, height: u32) -> Cow<'_, RgbaImage> {
    if image.dimensions() == (width, height) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(image, width, height, RESAMPLE_FILTER))
    }
}

fn scaled_len(len: u32, factor: f32) -> u32 {
    ((len as f32 * factor).round() as u32).max(1)
}

/// Uniform Lanczos rescale by `factor`.
pub fn scale(image: &RgbaImage, factor: f32) -> Result<RgbaImage, ImagingError> {
    scale_with_aspect(image, factor, 1.0)
}

/// Rescale by `factor`, additionally stretching the horizontal axis by
/// `aspect_ratio`.
pub fn scale_with_aspect(
    image: &RgbaImage,
    factor: f32,
    aspect_ratio: f32,
) -> Result<RgbaImage, ImagingError> {
    ensure_raster(image, "scaled image")?;
    let width = scaled_len(image.width(), factor * aspect_ratio);
    let height = scaled_len(image.height(), factor);
    Ok(stretched_to(image, width, height).into_owned())
}

/// Aspect-preserving resize so the image fits inside `width` x `height`,
/// flattened over `fill`. Dimensions are floored.
pub fn fit_within(
    image: &RgbaImage,
    width: u32,
    height: u32,
    fill: Rgba<u8>,
) -> Result<RgbaImage, ImagingError> {
    ensure_raster(image, "fitted image")?;
    let ratio_x = f64::from(width) / f64::from(image.width());
    let ratio_y = f64::from(height) / f64::from(image.height());
    let ratio = ratio_x.min(ratio_y);

    let fit_w = ((f64::from(image.width()) * ratio).floor() as u32).max(1);
    let fit_h = ((f64::from(image.height()) * ratio).floor() as u32).max(1);

    let resized = stretched_to(image, fit_w, fit_h);
    let mut canvas = RgbaImage::from_pixel(fit_w, fit_h, fill);
    blit(&mut canvas, &resized, 0, 0, BlendMode::SourceOver);
    Ok(canvas)
}

/// Crop a rectangle; the rectangle is clamped to the image bounds.
pub fn crop_rect(
    image: &RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<RgbaImage, ImagingError> {
    ensure_raster(image, "cropped image")?;
    let cropped = imageops::crop_imm(image, x, y, width, height).to_image();
    ensure_raster(&cropped, "crop rectangle")?;
    Ok(cropped)
}

/// Crop `width` x `height` out of the middle of `image`.
pub fn center_crop(image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, ImagingError> {
    let x = image.width().saturating_sub(width) / 2;
    let y = image.height().saturating_sub(height) / 2;
    crop_rect(image, x, y, width, height)
}

/// Crop to the tight bounding box of pixels whose alpha exceeds `min_alpha`
/// (in `[0, 1]`).
///
/// Scans every pixel. Returns an empty image when the input has no raster
/// data or no pixel qualifies.
pub fn crop_to_opaque_bounds(image: &RgbaImage, min_alpha: f32) -> RgbaImage {
    let _span = tracing::debug_span!("crop_to_opaque_bounds").entered();

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in image.enumerate_pixels() {
        if f32::from(p[3]) / 255.0 <= min_alpha {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    match bounds {
        Some((min_x, min_y, max_x, max_y)) => {
            imageops::crop_imm(image, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
                .to_image()
        }
        None => RgbaImage::new(0, 0),
    }
}

/// Run [`crop_to_opaque_bounds`] on the rayon pool and deliver the result
/// over a channel, keeping the full-image scan off the calling thread.
pub fn spawn_crop_to_opaque_bounds(image: Arc<RgbaImage>, min_alpha: f32) -> Receiver<RgbaImage> {
    let (tx, rx) = bounded(1);
    rayon::spawn(move || {
        let cropped = crop_to_opaque_bounds(&image, min_alpha);
        // The receiver may have been dropped; nobody is waiting then.
        let _ = tx.send(cropped);
    });
    rx
}
