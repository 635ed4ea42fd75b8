use crate::error::ImagingError;
use crate::imaging::{
    center_crop, draw_onto, inverted_background, remove_background, remove_foreground, scale,
    Mask, Offset,
};
use image::RgbaImage;

const SUBJECT_OFFSET: Offset = Offset::new(80.0, -220.0);
const SUBJECT_ANGLE: f32 = -5.0;

const SCENE_TILT: f32 = -4.0;
const SCENE_ZOOM: f32 = 1.2;
const SUBJECT_ZOOM: f32 = 1.1;

pub(super) fn inverted_background_rotated_foreground(
    current: &RgbaImage,
    next: &RgbaImage,
    mask: &Mask,
) -> Result<Vec<RgbaImage>, ImagingError> {
    let subject = remove_background(next, mask)?;
    let swapped = inverted_background(next, current, mask)?;

    Ok(vec![
        draw_onto(&subject, current, SUBJECT_OFFSET, SUBJECT_ANGLE)?,
        draw_onto(&subject, &swapped, SUBJECT_OFFSET, SUBJECT_ANGLE)?,
    ])
}

pub(super) fn invert_rotate_scale(
    current: &RgbaImage,
    next: &RgbaImage,
    mask: &Mask,
) -> Result<Vec<RgbaImage>, ImagingError> {
    let scene = remove_foreground(next, mask)?;
    // Zoom in, then crop back to the original extent around the center.
    let zoomed = center_crop(&scale(&scene, SCENE_ZOOM)?, scene.width(), scene.height())?;

    let first = draw_onto(&zoomed, current, Offset::ZERO, SCENE_TILT)?;
    let second = draw_onto(&scene, current, Offset::ZERO, SCENE_TILT)?;

    let subject = scale(&remove_background(next, mask)?, SUBJECT_ZOOM)?;
    let third = draw_onto(&subject, &second, Offset::ZERO, 0.0)?;

    let level = draw_onto(&scene, current, Offset::ZERO, 0.0)?;
    let fourth = draw_onto(&subject, &level, Offset::ZERO, 0.0)?;

    Ok(vec![first, second, third, fourth])
}
