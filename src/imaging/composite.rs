use super::blend::{mix, sample_bilinear, source_atop};
use super::transform::stretched_to;
use super::{ensure_mask, ensure_raster, Mask};
use crate::error::ImagingError;
use image::{imageops, Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect, Vec2};
use std::borrow::Cow;

/// A background is only resampled to the image extent when either scale
/// ratio deviates from 1.0 by more than this.
pub const CRITICAL_SCALE_DIFFERENCE: f64 = 0.1;

/// Translation in image coordinates (x to the right, y downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Blend `foreground` over `background` wherever `mask` marks foreground.
///
/// The output always has the background's extent; the mask and the
/// foreground are stretched to it with independent X/Y factors.
pub fn masked_composite(
    mask: &Mask,
    background: &RgbaImage,
    foreground: &RgbaImage,
) -> Result<RgbaImage, ImagingError> {
    ensure_raster(background, "masked composite background")?;
    ensure_raster(foreground, "masked composite foreground")?;
    ensure_mask(mask, "masked composite mask")?;

    let (w, h) = background.dimensions();
    let foreground = stretched_to(foreground, w, h);
    let mask = mask.fitted_to(w, h);

    Ok(RgbaImage::from_fn(w, h, |x, y| {
        mix(
            *foreground.get_pixel(x, y),
            *background.get_pixel(x, y),
            mask.weight(x, y),
        )
    }))
}

/// Keep only the pixels the mask marks as foreground.
pub fn remove_background(image: &RgbaImage, mask: &Mask) -> Result<RgbaImage, ImagingError> {
    ensure_raster(image, "masked extraction source")?;
    ensure_mask(mask, "masked extraction mask")?;

    let (w, h) = image.dimensions();
    let mask = mask.fitted_to(w, h);
    let mut out = image.clone();
    for (x, y, p) in out.enumerate_pixels_mut() {
        p[3] = (f32::from(p[3]) * mask.weight(x, y)).round() as u8;
    }
    Ok(out)
}

/// Keep only the pixels the mask marks as background.
pub fn remove_foreground(image: &RgbaImage, mask: &Mask) -> Result<RgbaImage, ImagingError> {
    remove_background(image, &mask.inverted())
}

/// Whether a background needs resampling given the image/background scale
/// ratios on each axis.
pub fn needs_background_rescale(scale_x: f64, scale_y: f64) -> bool {
    (1.0 - scale_x).abs() > CRITICAL_SCALE_DIFFERENCE
        || (1.0 - scale_y).abs() > CRITICAL_SCALE_DIFFERENCE
}

/// Swap the subject of `image` for the matching region of `background`.
///
/// Where the mask marks foreground the background shows through; everywhere
/// else `image` is kept. The output has `image`'s extent.
pub fn inverted_background(
    image: &RgbaImage,
    background: &RgbaImage,
    mask: &Mask,
) -> Result<RgbaImage, ImagingError> {
    ensure_raster(image, "inverted background source")?;
    ensure_raster(background, "inverted background backdrop")?;
    ensure_mask(mask, "inverted background mask")?;

    let (w, h) = image.dimensions();
    let scale_x = f64::from(w) / f64::from(background.width());
    let scale_y = f64::from(h) / f64::from(background.height());

    let background: Cow<'_, RgbaImage> = if needs_background_rescale(scale_x, scale_y) {
        tracing::trace!(scale_x, scale_y, "rescaling backdrop");
        Cow::Owned(imageops::resize(background, w, h, super::RESAMPLE_FILTER))
    } else {
        Cow::Borrowed(background)
    };
    let mask = mask.fitted_to(w, h);

    Ok(RgbaImage::from_fn(w, h, |x, y| {
        let backdrop = background
            .get_pixel_checked(x, y)
            .copied()
            .unwrap_or(Rgba([0, 0, 0, 0]));
        mix(backdrop, *image.get_pixel(x, y), mask.weight(x, y))
    }))
}

/// Source-to-background transform: rotate about the source center, then
/// move that center to the background center plus `position`.
pub fn placement(
    source: &RgbaImage,
    background: &RgbaImage,
    position: Offset,
    angle_degrees: f32,
) -> Affine {
    let source_center = Vec2::new(
        f64::from(source.width()) / 2.0,
        f64::from(source.height()) / 2.0,
    );
    let target_center = Vec2::new(
        f64::from(background.width()) / 2.0 + f64::from(position.x),
        f64::from(background.height()) / 2.0 + f64::from(position.y),
    );
    // y points down, so a counter-clockwise turn on screen is a negative angle.
    Affine::translate(target_center)
        * Affine::rotate(-f64::from(angle_degrees).to_radians())
        * Affine::translate(-source_center)
}

/// Composite `source` centered on `background`, rotated about its own center
/// by `angle_degrees` (counter-clockwise on screen) and then moved by
/// `position`. The result has the background's extent and alpha.
pub fn draw_onto(
    source: &RgbaImage,
    background: &RgbaImage,
    position: Offset,
    angle_degrees: f32,
) -> Result<RgbaImage, ImagingError> {
    ensure_raster(source, "drawn source")?;
    ensure_raster(background, "draw target")?;

    let transform = placement(source, background, position, angle_degrees);
    let to_source = transform.inverse();
    let bounds = transform
        .transform_rect_bbox(Rect::new(
            0.0,
            0.0,
            f64::from(source.width()),
            f64::from(source.height()),
        ))
        .inflate(1.0, 1.0);

    let mut out = background.clone();
    for (x, y, p) in out.enumerate_pixels_mut() {
        let at = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        if !bounds.contains(at) {
            continue;
        }
        let s = to_source * at;
        let s = sample_bilinear(source, s.x as f32, s.y as f32);
        if s[3] <= 0.0 {
            continue;
        }
        *p = source_atop(s, *p);
    }
    Ok(out)
}
