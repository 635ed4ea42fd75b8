//! The closed catalog of cut transitions.
//!
//! A [`Strategy`] turns one adjacent photo pair plus the subject mask into
//! an ordered list of intermediate frames. Every variant is a pure function
//! of its inputs; the only internal concurrency is the stroke fan-out in
//! [`Strategy::StrokeAppearing`].

mod appearing;
mod collage;
mod rotation;
mod scaling;
mod selector;

pub use selector::StrategyTable;

use crate::error::ImagingError;
use crate::imaging::{masked_composite, Mask};
use image::RgbaImage;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Strategy {
    /// Single masked composite of the next photo over the current one.
    Default,
    /// Rotated subject over the current photo, then over an inverted-background composite.
    InvertedBackgroundAndRotatedForeground,
    /// Composite through an edge-boosted mask, then the subject on top.
    SlowAppearing,
    /// Progressively thicker black/white outlines revealing the subject.
    StrokeAppearing,
    /// Scaled and rotated scene cut-outs layered under the subject.
    InvertRotateScale,
    /// Enlarged subject over the current photo, then over the next one.
    ForegroundScaling,
    /// Cumulative collage of subject copies.
    CopySpam,
    /// Height-matched scene cut-out, enlarged then at natural size.
    InvertedBackgroundScaling,
    /// Enlarged subject, then the full inverted-background composite.
    InvertedBackgroundScalingAlt,
}

impl Strategy {
    pub const ALL: [Strategy; 9] = [
        Strategy::Default,
        Strategy::InvertedBackgroundAndRotatedForeground,
        Strategy::SlowAppearing,
        Strategy::StrokeAppearing,
        Strategy::InvertRotateScale,
        Strategy::ForegroundScaling,
        Strategy::CopySpam,
        Strategy::InvertedBackgroundScaling,
        Strategy::InvertedBackgroundScalingAlt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Default => "default",
            Strategy::InvertedBackgroundAndRotatedForeground => {
                "inverted-background-and-rotated-foreground"
            }
            Strategy::SlowAppearing => "slow-appearing",
            Strategy::StrokeAppearing => "stroke-appearing",
            Strategy::InvertRotateScale => "invert-rotate-scale",
            Strategy::ForegroundScaling => "foreground-scaling",
            Strategy::CopySpam => "copy-spam",
            Strategy::InvertedBackgroundScaling => "inverted-background-scaling",
            Strategy::InvertedBackgroundScalingAlt => "inverted-background-scaling-alt",
        }
    }

    /// Number of frames a successful run produces.
    pub fn frame_count(self) -> usize {
        match self {
            Strategy::Default => 1,
            Strategy::InvertedBackgroundAndRotatedForeground => 2,
            Strategy::SlowAppearing => 2,
            Strategy::StrokeAppearing => 1 + appearing::STROKE_THICKNESSES.len(),
            Strategy::InvertRotateScale => 4,
            Strategy::ForegroundScaling => 2,
            Strategy::CopySpam => 6,
            Strategy::InvertedBackgroundScaling => 2,
            Strategy::InvertedBackgroundScalingAlt => 2,
        }
    }

    /// Produce this cut's frames for `current` -> `next`.
    ///
    /// Never fails: when any input lacks raster data the cut degrades to a
    /// single unmodified copy of `next`, so one bad pair cannot abort a batch.
    pub fn produce_frames(self, current: &RgbaImage, next: &RgbaImage, mask: &Mask) -> Vec<RgbaImage> {
        let _span = tracing::debug_span!("strategy", name = self.name()).entered();
        match self.try_produce_frames(current, next, mask) {
            Ok(frames) => {
                tracing::debug!(frames = frames.len(), "cut produced");
                frames
            }
            Err(err) => {
                tracing::warn!(strategy = self.name(), error = %err, "falling back to unmodified photo");
                vec![next.clone()]
            }
        }
    }

    /// Like [`Strategy::produce_frames`] but surfaces raster failures.
    pub fn try_produce_frames(
        self,
        current: &RgbaImage,
        next: &RgbaImage,
        mask: &Mask,
    ) -> Result<Vec<RgbaImage>, ImagingError> {
        match self {
            Strategy::Default => Ok(vec![masked_composite(mask, current, next)?]),
            Strategy::InvertedBackgroundAndRotatedForeground => {
                rotation::inverted_background_rotated_foreground(current, next, mask)
            }
            Strategy::SlowAppearing => appearing::slow_appearing(current, next, mask),
            Strategy::StrokeAppearing => appearing::stroke_appearing(current, next, mask),
            Strategy::InvertRotateScale => rotation::invert_rotate_scale(current, next, mask),
            Strategy::ForegroundScaling => scaling::foreground_scaling(current, next, mask),
            Strategy::CopySpam => collage::copy_spam(current, next, mask),
            Strategy::InvertedBackgroundScaling => {
                scaling::inverted_background_scaling(current, next, mask)
            }
            Strategy::InvertedBackgroundScalingAlt => {
                scaling::inverted_background_scaling_alt(current, next, mask)
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    /// A scene with a bright rectangular "subject" in the middle.
    pub(crate) fn photo(w: u32, h: u32, tint: u8) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            let subject = x > w / 3 && x < 2 * w / 3 && y > h / 4 && y < 3 * h / 4;
            if subject {
                Rgba([240, 220, tint, 255])
            } else {
                Rgba([tint, (x * 3) as u8, (y * 5) as u8, 255])
            }
        })
    }

    pub(crate) fn subject_mask(w: u32, h: u32) -> Mask {
        Mask::from_fn(w, h, |x, y| {
            if x > w / 3 && x < 2 * w / 3 && y > h / 4 && y < 3 * h / 4 {
                1.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn every_strategy_honours_its_frame_count() {
        let current = photo(36, 48, 10);
        let next = photo(36, 48, 200);
        let mask = subject_mask(18, 24);
        for strategy in Strategy::ALL {
            let frames = strategy.try_produce_frames(&current, &next, &mask).unwrap();
            assert_eq!(frames.len(), strategy.frame_count(), "{strategy}");
            assert!(frames.iter().all(|f| f.width() > 0 && f.height() > 0), "{strategy}");
        }
    }

    #[test]
    fn documented_frame_counts() {
        let counts: Vec<usize> = Strategy::ALL.iter().map(|s| s.frame_count()).collect();
        assert_eq!(counts, vec![1, 2, 2, 4, 4, 2, 6, 2, 2]);
    }

    #[test]
    fn strategies_tolerate_mismatched_photo_sizes() {
        let current = photo(40, 30, 10);
        let next = photo(30, 50, 90);
        let mask = subject_mask(64, 64);
        for strategy in Strategy::ALL {
            let frames = strategy.try_produce_frames(&current, &next, &mask).unwrap();
            assert_eq!(frames.len(), strategy.frame_count(), "{strategy}");
        }
    }

    #[test]
    fn missing_raster_falls_back_to_next_photo() {
        let current = RgbaImage::new(0, 0);
        let next = photo(20, 20, 3);
        let mask = subject_mask(20, 20);
        for strategy in Strategy::ALL {
            let frames = strategy.produce_frames(&current, &next, &mask);
            assert_eq!(frames, vec![next.clone()], "{strategy}");
        }
    }

    #[test]
    fn empty_mask_falls_back_too() {
        let current = photo(20, 20, 3);
        let next = photo(20, 20, 9);
        let mask = Mask::new(image::GrayImage::new(0, 0));
        let frames = Strategy::CopySpam.produce_frames(&current, &next, &mask);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], next);
    }

    #[test]
    fn default_cut_is_masked_composite() {
        let current = photo(24, 24, 0);
        let next = photo(24, 24, 255);
        let mask = subject_mask(24, 24);
        let frames = Strategy::Default.produce_frames(&current, &next, &mask);
        assert_eq!(frames[0].get_pixel(12, 12), next.get_pixel(12, 12));
        assert_eq!(frames[0].get_pixel(1, 1), current.get_pixel(1, 1));
    }

    #[test]
    fn names_round_trip_through_clap() {
        use clap::ValueEnum;
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::from_str(strategy.name(), false), Ok(strategy));
        }
    }
}
