use super::FrameStore;
use crate::error::{PipelineError, PipelineResult};
use crate::Frame;

/// Flatten the per-pair store into the global timeline.
///
/// Walks PairIndex ascending, then FrameIndex ascending, so the result is
/// independent of the order in which pairs completed. The store is drained.
pub fn assemble(store: &FrameStore) -> PipelineResult<Vec<Frame>> {
    let _span = tracing::debug_span!("assemble", pairs = store.len()).entered();

    let pairs = store.take_pairs()?;
    let mut timeline = Vec::with_capacity(pairs.iter().map(Vec::len).sum());
    for (pair, frames) in pairs.into_iter().enumerate() {
        // Every completed pair starts with its current photo.
        if frames.is_empty() {
            return Err(PipelineError::IncompleteTimeline { pair });
        }
        timeline.extend(frames);
    }

    tracing::debug!(frames = timeline.len(), "timeline assembled");
    Ok(timeline)
}
