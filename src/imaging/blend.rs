use image::{Rgba, RgbaImage};

/// Premultiplied RGBA with every channel in `[0, 1]`.
pub(crate) type Premul = [f32; 4];

pub(crate) const TRANSPARENT: Premul = [0.0; 4];

pub(crate) fn premultiply(p: Rgba<u8>) -> Premul {
    let a = f32::from(p[3]) / 255.0;
    [
        f32::from(p[0]) / 255.0 * a,
        f32::from(p[1]) / 255.0 * a,
        f32::from(p[2]) / 255.0 * a,
        a,
    ]
}

pub(crate) fn unpremultiply(c: Premul) -> Rgba<u8> {
    let a = c[3].clamp(0.0, 1.0);
    if a <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |v: f32| ((v / a).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([channel(c[0]), channel(c[1]), channel(c[2]), (a * 255.0).round() as u8])
}

/// `fg * m + bg * (1 - m)` in premultiplied space.
pub(crate) fn mix(fg: Rgba<u8>, bg: Rgba<u8>, m: f32) -> Rgba<u8> {
    if m >= 1.0 {
        return fg;
    }
    if m <= 0.0 {
        return bg;
    }
    let f = premultiply(fg);
    let b = premultiply(bg);
    let inv = 1.0 - m;
    unpremultiply([
        f[0] * m + b[0] * inv,
        f[1] * m + b[1] * inv,
        f[2] * m + b[2] * inv,
        f[3] * m + b[3] * inv,
    ])
}

/// Source-over: `src + dst * (1 - src.a)`.
pub(crate) fn source_over(src: Premul, dst: Rgba<u8>) -> Rgba<u8> {
    let d = premultiply(dst);
    let inv = 1.0 - src[3];
    unpremultiply([
        src[0] + d[0] * inv,
        src[1] + d[1] * inv,
        src[2] + d[2] * inv,
        src[3] + d[3] * inv,
    ])
}

/// Source-atop: source is only visible where the destination has coverage,
/// and the result keeps the destination's alpha.
pub(crate) fn source_atop(src: Premul, dst: Rgba<u8>) -> Rgba<u8> {
    let d = premultiply(dst);
    let inv = 1.0 - src[3];
    unpremultiply([
        src[0] * d[3] + d[0] * inv,
        src[1] * d[3] + d[1] * inv,
        src[2] * d[3] + d[2] * inv,
        d[3],
    ])
}

/// Destination-over: source is painted behind what is already there.
pub(crate) fn destination_over(src: Premul, dst: Rgba<u8>) -> Rgba<u8> {
    let d = premultiply(dst);
    let inv = 1.0 - d[3];
    unpremultiply([
        d[0] + src[0] * inv,
        d[1] + src[1] * inv,
        d[2] + src[2] * inv,
        d[3] + src[3] * inv,
    ])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlendMode {
    SourceOver,
    DestinationOver,
}

/// Copy `src` onto `dst` with its top-left corner at `(left, top)`.
/// Pixels falling outside `dst` are clipped.
pub(crate) fn blit(dst: &mut RgbaImage, src: &RgbaImage, left: i64, top: i64, mode: BlendMode) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    for (sx, sy, p) in src.enumerate_pixels() {
        if p[3] == 0 {
            continue;
        }
        let x = left + i64::from(sx);
        let y = top + i64::from(sy);
        if x < 0 || y < 0 || x >= dw || y >= dh {
            continue;
        }
        let target = dst.get_pixel_mut(x as u32, y as u32);
        let s = premultiply(*p);
        *target = match mode {
            BlendMode::SourceOver => source_over(s, *target),
            BlendMode::DestinationOver => destination_over(s, *target),
        };
    }
}

fn texel(image: &RgbaImage, x: i64, y: i64) -> Premul {
    if x < 0 || y < 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
        TRANSPARENT
    } else {
        premultiply(*image.get_pixel(x as u32, y as u32))
    }
}

/// Bilinear sample at continuous coordinates where pixel `(i, j)` covers
/// `[i, i + 1) x [j, j + 1)`. Outside the raster everything is transparent.
pub(crate) fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> Premul {
    let u = x - 0.5;
    let v = y - 0.5;
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = texel(image, x0, y0);
    let p10 = texel(image, x0 + 1, y0);
    let p01 = texel(image, x0, y0 + 1);
    let p11 = texel(image, x0 + 1, y0 + 1);

    let mut out = TRANSPARENT;
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bottom = p01[c] + (p11[c] - p01[c]) * fx;
        out[c] = top + (bottom - top) * fy;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_extremes_return_inputs() {
        let fg = Rgba([10, 20, 30, 255]);
        let bg = Rgba([200, 100, 50, 255]);
        assert_eq!(mix(fg, bg, 1.0), fg);
        assert_eq!(mix(fg, bg, 0.0), bg);
    }

    #[test]
    fn source_atop_keeps_destination_alpha() {
        let out = source_atop(premultiply(Rgba([255, 0, 0, 255])), Rgba([0, 0, 255, 128]));
        assert_eq!(out[3], 128);
        assert_eq!(out[0], 255);
    }

    #[test]
    fn destination_over_does_not_cover_opaque_pixels() {
        let out = destination_over(premultiply(Rgba([0, 0, 0, 255])), Rgba([9, 9, 9, 255]));
        assert_eq!(out, Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn bilinear_sample_at_pixel_center_is_exact() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let s = sample_bilinear(&img, 1.5, 0.5);
        assert_eq!(unpremultiply(s), Rgba([255, 255, 255, 255]));
        assert_eq!(sample_bilinear(&img, -4.0, 0.5), TRANSPARENT);
    }
}
