use super::blend::{blit, BlendMode};
use super::ensure_raster;
use crate::error::ImagingError;
use image::{Rgba, RgbaImage};

const DEFAULT_ROTATION_STEPS: u32 = 8;
const DEFAULT_EXTRUSION_STEPS: u32 = 1;

/// Replace every pixel's color with `color`, keeping the original coverage.
pub fn fill_silhouette(image: &RgbaImage, color: Rgba<u8>) -> RgbaImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        let alpha = u16::from(p[3]) * u16::from(color[3]) / 255;
        *p = Rgba([color[0], color[1], color[2], alpha as u8]);
    }
    out
}

/// Canvas size of a stroked `width` x `height` image. The horizontal padding
/// is scaled by the aspect ratio so the canvas keeps the source proportions.
pub fn stroked_extent(width: u32, height: u32, thickness: f32) -> (u32, u32) {
    let thickness = thickness.max(0.0);
    let aspect = width as f32 / height.max(1) as f32;
    (
        (width as f32 + 2.0 * thickness * aspect).round() as u32,
        (height as f32 + 2.0 * thickness).round() as u32,
    )
}

/// Outline `image` with `color`, using 8 rotation steps and 1 extrusion step.
pub fn apply_stroke(
    image: &RgbaImage,
    color: Rgba<u8>,
    thickness: f32,
) -> Result<RgbaImage, ImagingError> {
    apply_stroke_with(
        image,
        color,
        thickness,
        DEFAULT_ROTATION_STEPS,
        DEFAULT_EXTRUSION_STEPS,
    )
}

/// Outline `image` by stamping its solid-color silhouette around a circle.
///
/// Stamps are placed at `rotation_steps` evenly spaced angles (outer loop)
/// and `extrusion_steps` evenly spaced radii up to `thickness` (inner loop),
/// each painted behind what is already on the canvas. The original image is
/// drawn last, centered on top.
pub fn apply_stroke_with(
    image: &RgbaImage,
    color: Rgba<u8>,
    thickness: f32,
    rotation_steps: u32,
    extrusion_steps: u32,
) -> Result<RgbaImage, ImagingError> {
    ensure_raster(image, "stroked image")?;
    let thickness = thickness.max(0.0);
    let (w, h) = image.dimensions();
    let (out_w, out_h) = stroked_extent(w, h, thickness);

    let origin_x = (f64::from(out_w - w) / 2.0).round() as i64;
    let origin_y = (f64::from(out_h - h) / 2.0).round() as i64;

    let stamp = fill_silhouette(image, color);
    let mut canvas = RgbaImage::new(out_w, out_h);

    let rotation_increment = if rotation_steps > 0 {
        360.0 / rotation_steps as f32
    } else {
        360.0
    };
    let extrusion_increment = if extrusion_steps > 0 {
        thickness / extrusion_steps as f32
    } else {
        thickness
    };

    for rotation in 0..rotation_steps {
        let angle = (rotation as f32 * rotation_increment).to_radians();
        let (sin, cos) = angle.sin_cos();
        for extrusion in 1..=extrusion_steps {
            let distance = extrusion as f32 * extrusion_increment;
            let dx = (distance * cos).round() as i64;
            let dy = (distance * sin).round() as i64;
            blit(
                &mut canvas,
                &stamp,
                origin_x + dx,
                origin_y + dy,
                BlendMode::DestinationOver,
            );
        }
    }

    blit(&mut canvas, image, origin_x, origin_y, BlendMode::SourceOver);
    Ok(canvas)
}
