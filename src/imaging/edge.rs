use super::{ensure_raster, Mask};
use crate::error::ImagingError;
use image::{imageops, GrayImage, RgbaImage};

/// Radius of the edge operator used by the appearing cuts.
pub const EDGE_RADIUS: f32 = 8.0;

/// Edge-detected single-channel representation of `image` at its own extent.
pub fn edge_mask(image: &RgbaImage) -> Result<Mask, ImagingError> {
    edge_mask_with_radius(image, EDGE_RADIUS)
}

/// Blur the luma with a Gaussian of sigma `radius / 2`, take the Sobel
/// gradient magnitude, normalize it by its maximum and push it through a
/// smoothstep so strong contours saturate.
pub fn edge_mask_with_radius(image: &RgbaImage, radius: f32) -> Result<Mask, ImagingError> {
    ensure_raster(image, "edge source")?;
    let _span = tracing::debug_span!("edge_mask", radius).entered();

    let luma = imageops::grayscale(image);
    let blurred = if radius > 0.0 {
        imageops::blur(&luma, radius / 2.0)
    } else {
        luma
    };

    let (w, h) = blurred.dimensions();
    let magnitudes = sobel_magnitudes(&blurred);
    let peak = magnitudes.iter().copied().fold(0.0f32, f32::max);
    if peak <= f32::EPSILON {
        return Ok(Mask::from_fn(w, h, |_, _| 0.0));
    }

    Ok(Mask::from_fn(w, h, |x, y| {
        let normalized = magnitudes[(y * w + x) as usize] / peak;
        smoothstep(0.05, 0.35, normalized)
    }))
}

fn sobel_magnitudes(gray: &GrayImage) -> Vec<f32> {
    let (w, h) = gray.dimensions();
    let at = |x: i64, y: i64| -> f32 {
        let cx = x.clamp(0, i64::from(w) - 1) as u32;
        let cy = y.clamp(0, i64::from(h) - 1) as u32;
        f32::from(gray.get_pixel(cx, cy)[0])
    };

    let mut out = Vec::with_capacity((w * h) as usize);
    for y in 0..i64::from(h) {
        for x in 0..i64::from(w) {
            let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x - 1, y)
                - at(x - 1, y + 1);
            let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x, y - 1)
                - at(x + 1, y - 1);
            out.push((gx * gx + gy * gy).sqrt());
        }
    }
    out
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Additive mask combination: `clamp(mask + extra)` at `mask`'s extent, with
/// `extra` rescaled to match.
pub fn composite_addition_mask(mask: &Mask, extra: &Mask) -> Mask {
    let (w, h) = mask.dimensions();
    if extra.is_empty() {
        return mask.clone();
    }
    let extra = extra.fitted_to(w, h);
    Mask::from_fn(w, h, |x, y| mask.weight(x, y) + extra.weight(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn flat_image_has_no_edges() {
        let img = RgbaImage::from_pixel(24, 24, Rgba([120, 120, 120, 255]));
        let mask = edge_mask(&img).unwrap();
        assert_eq!(mask.dimensions(), (24, 24));
        assert!(mask.as_gray().pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn contour_lights_up_along_the_boundary() {
        let img = RgbaImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let mask = edge_mask(&img).unwrap();
        assert!(mask.weight(32, 32) > 0.9);
        assert_eq!(mask.weight(2, 32), 0.0);
        assert_eq!(mask.weight(61, 32), 0.0);
    }

    #[test]
    fn addition_saturates_and_uses_mask_extent() {
        let base = Mask::from_fn(10, 10, |_, _| 0.6);
        let extra = Mask::from_fn(5, 5, |_, _| 0.6);
        let sum = composite_addition_mask(&base, &extra);
        assert_eq!(sum.dimensions(), (10, 10));
        assert_eq!(sum.weight(4, 4), 1.0);
    }
}
