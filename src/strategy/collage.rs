use crate::error::ImagingError;
use crate::imaging::{draw_onto, fit_within, remove_background, scale, Mask, Offset};
use image::{Rgba, RgbaImage};

const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SMALL: f32 = 0.9;
const SMALLER: f32 = 0.8;

/// Stamp copies of the subject one after another, each frame building on the
/// previous one.
pub(super) fn copy_spam(
    current: &RgbaImage,
    next: &RgbaImage,
    mask: &Mask,
) -> Result<Vec<RgbaImage>, ImagingError> {
    let normalized = fit_within(next, current.width(), current.height(), FILL)?;
    let subject = remove_background(&normalized, mask)?;
    let small = scale(&subject, SMALL)?;
    let smaller = scale(&small, SMALLER)?;

    let (w, h) = (current.width() as f32, current.height() as f32);
    let placements = [
        (&subject, Offset::new(w / 4.0, -h * 2.0 / 5.0)),
        (&small, Offset::new(-w / 5.0, -h * 7.0 / 10.0)),
        (&smaller, Offset::new(-w / 3.0, 0.0)),
        (&small, Offset::new(w / 3.0, 0.0)),
        (&subject, Offset::new(-w / 3.0, -h / 2.0)),
        (&subject, Offset::ZERO),
    ];

    let mut frames: Vec<RgbaImage> = Vec::with_capacity(placements.len());
    for (stamp, position) in placements {
        let base = frames.last().unwrap_or(current);
        let frame = draw_onto(stamp, base, position, 0.0)?;
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::{photo, subject_mask};

    #[test]
    fn collage_accumulates() {
        let current = photo(60, 60, 0);
        let next = photo(60, 60, 255);
        let frames = copy_spam(&current, &next, &subject_mask(60, 60)).unwrap();
        assert_eq!(frames.len(), 6);

        let touched = |frame: &RgbaImage| {
            frame
                .enumerate_pixels()
                .filter(|(x, y, p)| *p != current.get_pixel(*x, *y))
                .count()
        };
        let counts: Vec<usize> = frames.iter().map(touched).collect();
        assert!(counts[0] > 0);
        assert!(counts.windows(2).all(|pair| pair[1] >= pair[0]), "{counts:?}");
    }
}
