//! Per-line size table.
//!
//! Every line of the content has a [`LineSize`] whose width and height start
//! unset. Heights of fixed-height lines are synthesized without shaping;
//! everything else is resolved by shaping the line, either on demand or by the
//! idle fill. Measured heights are folded into a rolling average that stands in
//! for lines nobody has measured yet.

use std::rc::Rc;
use std::time::Duration;

/// Cached size of one line. `None` means the value must be recomputed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl LineSize {
    /// Check if either dimension is unset.
    #[must_use]
    pub fn needs_recalculate(&self) -> bool {
        self.width.is_none() || self.height.is_none()
    }

    /// Check if a cached layout for the line may still be reused.
    #[must_use]
    pub fn can_layout(&self) -> bool {
        self.width.is_some()
    }
}

/// Line size table with rolling average height and widest-line tracking.
#[derive(Clone, Debug, Default)]
pub struct LineMetrics {
    sizes: Vec<LineSize>,
    average_height: f32,
    samples: usize,
    widest: Option<(usize, u32)>,
    widest_stale: bool,
}

impl LineMetrics {
    /// Create a table of `line_count` unset lines.
    #[must_use]
    pub fn new(line_count: usize) -> Self {
        Self {
            sizes: vec![LineSize::default(); line_count],
            ..Self::default()
        }
    }

    /// Number of lines tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Check if no lines are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Size of a line; unset for lines out of range.
    #[must_use]
    pub fn get(&self, line: usize) -> LineSize {
        self.sizes.get(line).copied().unwrap_or_default()
    }

    /// Rolling average of measured heights, rounded like the samples.
    #[must_use]
    pub fn average_height(&self) -> Option<u32> {
        (self.samples > 0).then(|| self.average_height.round().max(0.0) as u32)
    }

    /// Number of measurements folded into the average.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Discard everything and track `line_count` unset lines.
    pub fn rebuild(&mut self, line_count: usize) {
        *self = Self::new(line_count);
    }

    /// Record a measured line size.
    pub fn record(&mut self, line: usize, width: u32, height: u32) {
        let Some(size) = self.sizes.get_mut(line) else {
            return;
        };
        size.width = Some(width);
        size.height = Some(height);

        // Integer step, matching how the rounded average is consumed.
        self.samples += 1;
        let step = (i64::from(height) - self.average_height.round() as i64) / self.samples as i64;
        self.average_height += step as f32;

        if !self.widest_stale && self.widest.is_none_or(|(_, w)| width > w) {
            self.widest = Some((line, width));
        }
    }

    /// Store a synthesized fixed height without touching the average.
    pub fn set_fixed_height(&mut self, line: usize, height: u32) {
        if let Some(size) = self.sizes.get_mut(line) {
            size.height = Some(height);
        }
    }

    /// Mark lines unset.
    ///
    /// Only lines that carried a measurement leave the average, so resetting
    /// the same lines twice is the same as resetting them once.
    pub fn reset<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let mut measured = 0usize;
        for line in lines {
            let Some(size) = self.sizes.get_mut(line) else {
                continue;
            };
            if size.width.is_some() && size.height.is_some() {
                measured += 1;
            }
            *size = LineSize::default();
            if self.widest.is_some_and(|(index, _)| index == line) {
                self.widest_stale = true;
            }
        }
        if self.samples > measured {
            self.samples -= measured;
        } else {
            self.samples = 0;
            self.average_height = 0.0;
        }
    }

    /// Mark every line unset.
    pub fn reset_all(&mut self) {
        let count = self.sizes.len();
        self.reset(0..count);
    }

    /// Splice the table for an edit starting on `start_line` that removes
    /// `replaced_lines` line breaks and adds `new_lines`.
    pub fn apply_edit(&mut self, start_line: usize, replaced_lines: usize, new_lines: usize) {
        let start = start_line.min(self.sizes.len());
        let end = (start_line + replaced_lines + 1).min(self.sizes.len());
        debug_assert!(
            start_line + replaced_lines < self.sizes.len(),
            "edit spans lines {start_line}..={} of {}",
            start_line + replaced_lines,
            self.sizes.len()
        );
        self.sizes
            .splice(start..end, std::iter::repeat_n(LineSize::default(), new_lines + 1));

        if let Some((index, width)) = self.widest {
            if (start_line..=start_line + replaced_lines).contains(&index) {
                self.widest_stale = true;
            } else if index > start_line + replaced_lines {
                let shifted = index + new_lines - replaced_lines;
                self.widest = Some((shifted, width));
            }
        }
    }

    /// Widest resolved line as `(line, width)`, rescanning when stale.
    pub fn widest(&mut self) -> Option<(usize, u32)> {
        if self.widest_stale {
            self.widest_stale = false;
            self.widest = self
                .sizes
                .iter()
                .enumerate()
                .filter_map(|(i, size)| size.width.map(|w| (i, w)))
                .fold(None, |best, (i, w)| match best {
                    Some((_, bw)) if bw >= w => best,
                    _ => Some((i, w)),
                });
        }
        self.widest
    }

    /// First unresolved line at or after `from`, wrapping around once.
    #[must_use]
    pub fn next_unresolved(&self, from: usize) -> Option<usize> {
        let from = from.min(self.sizes.len());
        let (before, after) = self.sizes.split_at(from);
        after
            .iter()
            .position(LineSize::needs_recalculate)
            .map(|i| i + from)
            .or_else(|| before.iter().position(LineSize::needs_recalculate))
    }

    /// Check if any line is unresolved.
    #[must_use]
    pub fn has_unresolved(&self) -> bool {
        self.sizes.iter().any(LineSize::needs_recalculate)
    }
}

/// Resumable background task resolving unset line sizes.
///
/// The host pumps it from its idle callback with
/// [`StyledTextRenderer::run_idle_burst`](super::StyledTextRenderer::run_idle_burst).
/// The renderer counts the fill as running while the task (or a clone of it)
/// is alive; dropping it frees the renderer to start a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdleFill {
    pub(crate) next_line: usize,
    pub(crate) budget: Duration,
    pub(crate) generation: u64,
    // Only held; the renderer watches it through a weak handle.
    pub(crate) _alive: Rc<()>,
}

impl IdleFill {
    /// Line the next burst starts scanning from.
    #[must_use]
    pub fn next_line(&self) -> usize {
        self.next_line
    }

    /// Time one burst may spend.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }
}

/// Outcome of one idle burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleStatus {
    /// Unresolved lines remain; schedule another burst.
    Pending,
    /// Every line is resolved, or the task was cancelled.
    Complete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lines_are_unset() {
        let metrics = LineMetrics::new(3);
        assert_eq!(metrics.len(), 3);
        assert!(metrics.get(1).needs_recalculate());
        assert!(!metrics.get(1).can_layout());
        assert!(metrics.has_unresolved());
        assert_eq!(metrics.average_height(), None);
    }

    #[test]
    fn test_rolling_average() {
        let mut metrics = LineMetrics::new(4);
        metrics.record(0, 10, 20);
        metrics.record(1, 10, 30);
        // 20 + (30 - 20) / 2
        assert_eq!(metrics.average_height(), Some(25));
        metrics.record(2, 10, 16);
        // 25 + (16 - 25) / 3 with integer division
        assert_eq!(metrics.average_height(), Some(22));
        assert_eq!(metrics.samples(), 3);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut metrics = LineMetrics::new(4);
        for line in 0..4 {
            metrics.record(line, 10 + line as u32, 20);
        }
        metrics.reset([1, 2]);
        let once = (metrics.samples(), metrics.get(1), metrics.get(3));
        metrics.reset([1, 2]);
        assert_eq!((metrics.samples(), metrics.get(1), metrics.get(3)), once);
        assert_eq!(metrics.samples(), 2);
    }

    #[test]
    fn test_reset_everything_clears_average() {
        let mut metrics = LineMetrics::new(2);
        metrics.record(0, 5, 12);
        metrics.reset_all();
        assert_eq!(metrics.average_height(), None);
        assert_eq!(metrics.widest(), None);
    }

    #[test]
    fn test_widest_rescans_lazily() {
        let mut metrics = LineMetrics::new(3);
        metrics.record(0, 40, 10);
        metrics.record(1, 90, 10);
        metrics.record(2, 60, 10);
        assert_eq!(metrics.widest(), Some((1, 90)));

        metrics.reset([1]);
        assert_eq!(metrics.widest(), Some((2, 60)));
    }

    #[test]
    fn test_apply_edit_splices_and_shifts_widest() {
        let mut metrics = LineMetrics::new(5);
        for line in 0..5 {
            metrics.record(line, 10, 10);
        }
        metrics.record(4, 50, 10);

        // Insert two line breaks on line 1.
        metrics.apply_edit(1, 0, 2);
        assert_eq!(metrics.len(), 7);
        assert!(metrics.get(0).width.is_some());
        assert!(metrics.get(1).needs_recalculate());
        assert!(metrics.get(3).needs_recalculate());
        assert!(metrics.get(4).width.is_some());
        assert_eq!(metrics.widest(), Some((6, 50)));

        // Join lines 5 and 6, which holds the widest line.
        metrics.apply_edit(5, 1, 0);
        assert_eq!(metrics.len(), 6);
        assert!(metrics.get(5).needs_recalculate());
        assert_eq!(metrics.widest(), Some((0, 10)));
    }

    #[test]
    fn test_next_unresolved_wraps() {
        let mut metrics = LineMetrics::new(4);
        metrics.record(2, 1, 1);
        metrics.record(3, 1, 1);
        assert_eq!(metrics.next_unresolved(2), Some(0));
        assert_eq!(metrics.next_unresolved(1), Some(1));
        metrics.record(0, 1, 1);
        metrics.record(1, 1, 1);
        assert_eq!(metrics.next_unresolved(0), None);
    }
}
