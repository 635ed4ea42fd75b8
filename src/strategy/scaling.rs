use crate::error::ImagingError;
use crate::imaging::{
    draw_onto, inverted_background, remove_background, remove_foreground, scale, Mask, Offset,
};
use image::RgbaImage;

const FOREGROUND_ZOOM: f32 = 1.2;
const CUTOUT_ZOOM: f32 = 1.3;

pub(super) fn foreground_scaling(
    current: &RgbaImage,
    next: &RgbaImage,
    mask: &Mask,
) -> Result<Vec<RgbaImage>, ImagingError> {
    let subject = scale(&remove_background(next, mask)?, FOREGROUND_ZOOM)?;
    Ok(vec![
        draw_onto(&subject, current, Offset::ZERO, 0.0)?,
        draw_onto(&subject, next, Offset::ZERO, 0.0)?,
    ])
}

/// Scene cut-out of `next`, scaled so its height matches `current`; first
/// enlarged, then at natural size.
pub(super) fn inverted_background_scaling(
    current: &RgbaImage,
    next: &RgbaImage,
    mask: &Mask,
) -> Result<Vec<RgbaImage>, ImagingError> {
    let scene = remove_foreground(next, mask)?;
    let height_ratio = current.height() as f32 / next.height() as f32;
    let matched = scale(&scene, height_ratio)?;
    let enlarged = scale(&matched, CUTOUT_ZOOM)?;

    Ok(vec![
        draw_onto(&enlarged, current, Offset::ZERO, 0.0)?,
        draw_onto(&matched, current, Offset::ZERO, 0.0)?,
    ])
}

pub(super) fn inverted_background_scaling_alt(
    current: &RgbaImage,
    next: &RgbaImage,
    mask: &Mask,
) -> Result<Vec<RgbaImage>, ImagingError> {
    let subject = scale(&remove_background(next, mask)?, CUTOUT_ZOOM)?;
    let swapped = inverted_background(next, current, mask)?;

    Ok(vec![
        draw_onto(&subject, current, Offset::ZERO, 0.0)?,
        draw_onto(&swapped, current, Offset::ZERO, 0.0)?,
    ])
}
