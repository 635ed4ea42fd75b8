use crate::error::{PipelineError, PipelineResult};
use crate::Frame;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lifecycle of one pair task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairState {
    Pending,
    SegmentationRunning,
    StrategyRunning,
    Complete,
    Failed,
}

impl PairState {
    fn is_terminal(self) -> bool {
        matches!(self, PairState::Complete | PairState::Failed)
    }
}

#[derive(Debug)]
struct PairSlot {
    state: PairState,
    frames: Vec<Frame>,
    failure: Option<PipelineError>,
}

/// Per-pair frame lists, one independently locked slot per PairIndex.
///
/// Each slot has a single writer (its pair task), so locks are only ever
/// contended by the consuming read after all tasks have finished.
#[derive(Debug)]
pub struct FrameStore {
    slots: Vec<Mutex<PairSlot>>,
}

impl FrameStore {
    pub fn new(pairs: usize) -> Self {
        let slots = (0..pairs)
            .map(|_| {
                Mutex::new(PairSlot {
                    state: PairState::Pending,
                    frames: Vec::new(),
                    failure: None,
                })
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, pair: usize) -> PipelineResult<MutexGuard<'_, PairSlot>> {
        let slot = self.slots.get(pair).ok_or_else(|| {
            PipelineError::validation(format!("pair {pair} is outside 0..{}", self.slots.len()))
        })?;
        // A panicking task leaves its slot non-terminal; the state says enough.
        Ok(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn state(&self, pair: usize) -> PipelineResult<PairState> {
        Ok(self.slot(pair)?.state)
    }

    /// Move a running pair to `next`. States only move forward.
    pub fn advance(&self, pair: usize, next: PairState) -> PipelineResult<()> {
        let mut slot = self.slot(pair)?;
        if slot.state.is_terminal() {
            return Err(PipelineError::DuplicateCompletion { pair });
        }
        slot.state = next;
        Ok(())
    }

    /// Store the pair's frame list and mark it complete.
    pub fn complete(&self, pair: usize, frames: Vec<Frame>) -> PipelineResult<()> {
        let mut slot = self.slot(pair)?;
        if slot.state.is_terminal() {
            return Err(PipelineError::DuplicateCompletion { pair });
        }
        slot.frames = frames;
        slot.state = PairState::Complete;
        Ok(())
    }

    pub fn fail(&self, pair: usize, error: PipelineError) -> PipelineResult<()> {
        let mut slot = self.slot(pair)?;
        if slot.state.is_terminal() {
            return Err(PipelineError::DuplicateCompletion { pair });
        }
        slot.failure = Some(error);
        slot.state = PairState::Failed;
        Ok(())
    }

    /// Append a frame after a completed pair's last frame.
    pub fn append_terminal(&self, pair: usize, frame: Frame) -> PipelineResult<()> {
        let mut slot = self.slot(pair)?;
        if slot.state != PairState::Complete {
            return Err(PipelineError::IncompleteTimeline { pair });
        }
        slot.frames.push(frame);
        Ok(())
    }

    /// Snapshot of a completed pair's frames.
    pub fn frames(&self, pair: usize) -> PipelineResult<Vec<Frame>> {
        let slot = self.slot(pair)?;
        if slot.state != PairState::Complete {
            return Err(PipelineError::IncompleteTimeline { pair });
        }
        Ok(slot.frames.clone())
    }

    /// Remove and return the failure of the lowest failed pair, if any.
    pub fn take_first_failure(&self) -> Option<PipelineError> {
        (0..self.slots.len()).find_map(|pair| self.slot(pair).ok()?.failure.take())
    }

    /// Drain the store into per-pair frame lists, in PairIndex order.
    ///
    /// Refuses, leaving the store untouched, if any pair is not complete.
    pub fn take_pairs(&self) -> PipelineResult<Vec<Vec<Frame>>> {
        let mut slots = Vec::with_capacity(self.slots.len());
        for pair in 0..self.slots.len() {
            let slot = self.slot(pair)?;
            if slot.state != PairState::Complete {
                return Err(PipelineError::IncompleteTimeline { pair });
            }
            slots.push(slot);
        }
        Ok(slots
            .into_iter()
            .map(|mut slot| std::mem::take(&mut slot.frames))
            .collect())
    }
}
