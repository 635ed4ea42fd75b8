use super::SegmentationModel;
use crate::imaging::Mask;
use anyhow::{ensure, Result};
use image::{imageops, RgbaImage};

/// Longest edge of the analysis copy.
const DEFAULT_ANALYSIS_EDGE: u32 = 256;

/// Heuristic segmenter for photos shot against a fairly uniform backdrop.
///
/// The backdrop colour is estimated from the border ring of a downscaled copy
/// (per-channel median), and each pixel's foreground weight ramps up with its
/// RGB distance from that colour. Masks are returned at the analysis
/// resolution, not the photo's.
#[derive(Clone, Debug)]
pub struct BorderKeySegmenter {
    analysis_edge: u32,
    /// Normalized RGB distance below which a pixel is pure background.
    low: f32,
    /// Normalized RGB distance above which a pixel is pure foreground.
    high: f32,
}

impl Default for BorderKeySegmenter {
    fn default() -> Self {
        Self {
            analysis_edge: DEFAULT_ANALYSIS_EDGE,
            low: 0.08,
            high: 0.2,
        }
    }
}

impl BorderKeySegmenter {
    pub fn new(analysis_edge: u32, low: f32, high: f32) -> Self {
        Self {
            analysis_edge: analysis_edge.max(8),
            low,
            high: high.max(low + f32::EPSILON),
        }
    }

    fn analysis_copy(&self, photo: &RgbaImage) -> RgbaImage {
        let (w, h) = photo.dimensions();
        let longest = w.max(h);
        if longest <= self.analysis_edge {
            return photo.clone();
        }
        let ratio = self.analysis_edge as f32 / longest as f32;
        let tw = ((w as f32 * ratio).round() as u32).max(1);
        let th = ((h as f32 * ratio).round() as u32).max(1);
        imageops::resize(photo, tw, th, imageops::FilterType::Triangle)
    }

    fn backdrop_colour(image: &RgbaImage) -> [f32; 3] {
        let (w, h) = image.dimensions();
        let ring = (w.min(h) / 16).max(1);
        let mut channels: [Vec<u8>; 3] = Default::default();

        for (x, y, p) in image.enumerate_pixels() {
            let on_border = x < ring || y < ring || x >= w - ring || y >= h - ring;
            if on_border {
                for (c, values) in channels.iter_mut().enumerate() {
                    values.push(p[c]);
                }
            }
        }

        channels.map(|mut values| {
            values.sort_unstable();
            f32::from(values[values.len() / 2])
        })
    }
}

impl SegmentationModel for BorderKeySegmenter {
    fn segment(&self, photo: &RgbaImage) -> Result<Mask> {
        let _span = tracing::debug_span!("border_key_segment").entered();
        ensure!(
            photo.width() > 0 && photo.height() > 0,
            "photo has no raster data"
        );

        let small = self.analysis_copy(photo);
        let backdrop = Self::backdrop_colour(&small);
        tracing::debug!(?backdrop, size = ?small.dimensions(), "estimated backdrop");

        let max_distance = (3.0f32 * 255.0 * 255.0).sqrt();
        let (low, high) = (self.low, self.high);
        Ok(Mask::from_fn(small.width(), small.height(), |x, y| {
            let p = small.get_pixel(x, y);
            let distance = (0..3)
                .map(|c| {
                    let d = f32::from(p[c]) - backdrop[c];
                    d * d
                })
                .sum::<f32>()
                .sqrt()
                / max_distance;
            let t = ((distance - low) / (high - low)).clamp(0.0, 1.0);
            t * t * (3.0 - 2.0 * t) * f32::from(p[3]) / 255.0
        }))
    }

    fn input_size(&self) -> (u32, u32) {
        (self.analysis_edge, self.analysis_edge)
    }

    fn name(&self) -> &str {
        "border-key"
    }
}
