use crate::error::ImagingError;
use crate::imaging::{
    apply_stroke, composite_addition_mask, draw_onto, edge_mask, masked_composite,
    remove_background, remove_foreground, Mask, Offset,
};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Outline thickness of each stroke stage; stage `i` strokes stage `i - 1`.
pub(super) const STROKE_THICKNESSES: [f32; 3] = [60.0, 80.0, 120.0];

const INNER_STROKE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const OUTER_STROKE: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub(super) fn slow_appearing(
    current: &RgbaImage,
    next: &RgbaImage,
    mask: &Mask,
) -> Result<Vec<RgbaImage>, ImagingError> {
    let first = masked_composite(mask, current, next)?;

    let boosted = composite_addition_mask(&edge_mask(next)?, mask);
    let layered = masked_composite(&boosted, current, next)?;
    let subject = remove_background(next, mask)?;
    let second = draw_onto(&subject, &layered, Offset::ZERO, 0.0)?;

    Ok(vec![first, second])
}

pub(super) fn stroke_appearing(
    current: &RgbaImage,
    next: &RgbaImage,
    mask: &Mask,
) -> Result<Vec<RgbaImage>, ImagingError> {
    let first = masked_composite(mask, current, next)?;
    let subject = remove_background(next, mask)?;

    let mut stages: Vec<RgbaImage> = Vec::with_capacity(STROKE_THICKNESSES.len());
    for thickness in STROKE_THICKNESSES {
        let base = stages.last().unwrap_or(&subject);
        let inner = apply_stroke(base, INNER_STROKE, thickness)?;
        stages.push(apply_stroke(&inner, OUTER_STROKE, thickness)?);
    }

    // Stage masks are independent of each other; the indexed collect keeps
    // them in stage order.
    let staged = stages
        .par_iter()
        .enumerate()
        .map(|(stage, outlined)| {
            let _span = tracing::trace_span!("stroke_stage", stage).entered();
            let stage_mask = stroke_stage_mask(outlined, mask)?;
            masked_composite(&stage_mask, current, next)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut frames = Vec::with_capacity(1 + staged.len());
    frames.push(first);
    frames.extend(staged);
    Ok(frames)
}

/// Punch the subject out of an outlined stage and add the subject mask back,
/// leaving subject + white outline as foreground.
fn stroke_stage_mask(outlined: &RgbaImage, mask: &Mask) -> Result<Mask, ImagingError> {
    let ring = remove_foreground(outlined, mask)?;
    Ok(composite_addition_mask(&Mask::from_red_channel(&ring), mask))
}
