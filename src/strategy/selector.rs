use super::Strategy;

/// Static PairIndex -> [`Strategy`] assignment, fixed before dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyTable {
    assignments: Vec<Strategy>,
    fallback: Strategy,
}

impl StrategyTable {
    /// The table used by the themed template: eight distinct cuts, then
    /// the default composite for any further pair.
    pub fn reference() -> Self {
        Self::new(vec![
            Strategy::InvertedBackgroundAndRotatedForeground,
            Strategy::SlowAppearing,
            Strategy::StrokeAppearing,
            Strategy::InvertRotateScale,
            Strategy::SlowAppearing,
            Strategy::ForegroundScaling,
            Strategy::CopySpam,
            Strategy::InvertedBackgroundScaling,
        ])
    }

    pub fn new(assignments: Vec<Strategy>) -> Self {
        Self {
            assignments,
            fallback: Strategy::Default,
        }
    }

    pub fn with_fallback(mut self, fallback: Strategy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn select(&self, pair: usize) -> Strategy {
        self.assignments.get(pair).copied().unwrap_or(self.fallback)
    }

    pub fn assignments(&self) -> &[Strategy] {
        &self.assignments
    }

    pub fn fallback(&self) -> Strategy {
        self.fallback
    }

    /// Timeline length for `photo_count` photos when every cut succeeds:
    /// each pair contributes its current photo plus its cut frames, and the
    /// last photo closes the timeline.
    pub fn expected_timeline_len(&self, photo_count: usize) -> usize {
        if photo_count < 2 {
            return photo_count;
        }
        let pairs: usize = (0..photo_count - 1)
            .map(|pair| 1 + self.select(pair).frame_count())
            .sum();
        pairs + 1
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::reference()
    }
}
