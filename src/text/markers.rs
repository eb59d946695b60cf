//! Per-line decorative markers (bullets, numbers, labels).
//!
//! Markers are tracked by line, independently of character styles. Two stores
//! exist and only one is live at a time:
//!
//! - [`MarkerSets`]: each marker owns a sorted set of the lines it decorates.
//!   This is what [`MarkerTracker::set_marker`] writes.
//! - [`PerLineMarkers`]: one optional marker per line, as produced by a
//!   line style provider through [`MarkerTracker::set_line_marker`].
//!
//! Writing in one mode discards whatever the other mode held.

use crate::style::TextStyle;
use std::sync::Arc;

/// How a marker renders its label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    #[default]
    Dot,
    /// 1, 2, 3, ...
    Number,
    /// a, b, ..., z, aa, ab, ...
    LetterLower,
    /// A, B, ..., Z, AA, AB, ...
    LetterUpper,
    /// The marker text alone.
    Text,
    /// Drawn by the host; the label is empty.
    Custom,
}

/// A per-line decoration.
///
/// Identity is the `Arc` allocation: two markers with equal fields are still
/// different markers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    /// Style of the label. Its glyph metrics width is added to the indent of
    /// every decorated line.
    pub style: TextStyle,
    /// Text appended to the label, or the whole label for [`MarkerKind::Text`].
    pub text: Option<String>,
}

/// Shared marker handle.
pub type MarkerRef = Arc<Marker>;

impl Marker {
    /// Create a marker without text.
    #[must_use]
    pub fn new(kind: MarkerKind, style: TextStyle) -> Self {
        Self {
            kind,
            style,
            text: None,
        }
    }

    /// Set the text appended to the label.
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Wrap in a shared handle.
    #[must_use]
    pub fn shared(self) -> MarkerRef {
        Arc::new(self)
    }

    /// Horizontal space the marker reserves in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.style.metrics.map_or(0, |m| m.width)
    }

    /// Label for the `ordinal`-th decorated line (0-based).
    #[must_use]
    pub fn label(&self, ordinal: usize) -> String {
        let mut label = match self.kind {
            MarkerKind::Dot => String::from("\u{2022}"),
            MarkerKind::Number => (ordinal + 1).to_string(),
            MarkerKind::LetterLower => letters(ordinal, b'a'),
            MarkerKind::LetterUpper => letters(ordinal, b'A'),
            MarkerKind::Text | MarkerKind::Custom => String::new(),
        };
        if self.kind != MarkerKind::Custom {
            if let Some(text) = &self.text {
                label.push_str(text);
            }
        }
        label
    }
}

/// Bijective base-26 numbering: a..z, aa..zz, aaa...
fn letters(ordinal: usize, base: u8) -> String {
    let mut n = ordinal + 1;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(base + (n % 26) as u8);
        n /= 26;
    }
    out.iter().rev().map(|&b| char::from(b)).collect()
}

/// Marker on a line plus its position among the marker's lines.
#[derive(Clone, Debug)]
pub struct LineMarker {
    pub marker: MarkerRef,
    pub ordinal: usize,
}

impl LineMarker {
    /// Label to draw on this line.
    #[must_use]
    pub fn label(&self) -> String {
        self.marker.label(self.ordinal)
    }
}

impl PartialEq for LineMarker {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.marker, &other.marker) && self.ordinal == other.ordinal
    }
}

impl Eq for LineMarker {}

/// Operations both marker stores support.
pub trait MarkerBacking {
    /// Marker on `line`, if any.
    fn marker_at(&self, line: usize) -> Option<LineMarker>;

    /// Remove markers from `[start_line, start_line + replaced)`; with
    /// `apply_shift`, lines at or after the removed span move by
    /// `inserted - replaced`. Returns the removed lines, or `None` when
    /// nothing was removed.
    fn remove_range(
        &mut self,
        start_line: usize,
        replaced: usize,
        inserted: usize,
        apply_shift: bool,
    ) -> Option<Vec<usize>>;

    /// Check if no line carries a marker.
    fn is_empty(&self) -> bool;
}

#[derive(Clone, Debug)]
struct MarkerSet {
    marker: MarkerRef,
    lines: Vec<usize>,
}

/// Store keeping a sorted line set per marker.
#[derive(Clone, Debug, Default)]
pub struct MarkerSets {
    sets: Vec<MarkerSet>,
}

impl MarkerSets {
    /// Add `[start_line, start_line + count)` to `marker`'s lines.
    pub fn add_range(&mut self, marker: &MarkerRef, start_line: usize, count: usize) {
        if count == 0 {
            return;
        }
        let set = match self
            .sets
            .iter()
            .position(|set| Arc::ptr_eq(&set.marker, marker))
        {
            Some(i) => &mut self.sets[i],
            None => {
                self.sets.push(MarkerSet {
                    marker: Arc::clone(marker),
                    lines: Vec::new(),
                });
                let last = self.sets.len() - 1;
                &mut self.sets[last]
            }
        };
        let end = start_line + count;
        let from = set.lines.partition_point(|&line| line < start_line);
        let to = set.lines.partition_point(|&line| line < end);
        set.lines.splice(from..to, start_line..end);
    }

    /// Lines decorated by `marker`, ascending.
    #[must_use]
    pub fn lines_of(&self, marker: &MarkerRef) -> Option<&[usize]> {
        self.sets
            .iter()
            .find(|set| Arc::ptr_eq(&set.marker, marker))
            .map(|set| set.lines.as_slice())
    }

    /// Markers with at least one line.
    pub fn markers(&self) -> impl Iterator<Item = &MarkerRef> {
        self.sets.iter().map(|set| &set.marker)
    }
}

impl MarkerBacking for MarkerSets {
    fn marker_at(&self, line: usize) -> Option<LineMarker> {
        self.sets.iter().find_map(|set| {
            set.lines.binary_search(&line).ok().map(|ordinal| LineMarker {
                marker: Arc::clone(&set.marker),
                ordinal,
            })
        })
    }

    fn remove_range(
        &mut self,
        start_line: usize,
        replaced: usize,
        inserted: usize,
        apply_shift: bool,
    ) -> Option<Vec<usize>> {
        let end = start_line + replaced;
        let mut removed = Vec::new();
        for set in &mut self.sets {
            let from = set.lines.partition_point(|&line| line < start_line);
            let to = set.lines.partition_point(|&line| line < end);
            removed.extend(set.lines.drain(from..to));
            if apply_shift {
                for line in &mut set.lines[from..] {
                    *line = *line + inserted - replaced;
                }
            }
        }
        self.sets.retain(|set| !set.lines.is_empty());
        if removed.is_empty() {
            return None;
        }
        removed.sort_unstable();
        removed.dedup();
        Some(removed)
    }

    fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Store keeping one optional marker per line.
#[derive(Clone, Debug, Default)]
pub struct PerLineMarkers {
    lines: Vec<Option<LineMarker>>,
}

impl PerLineMarkers {
    /// Set or clear the marker of one line.
    pub fn set(&mut self, line: usize, marker: Option<LineMarker>) {
        if line >= self.lines.len() {
            if marker.is_none() {
                return;
            }
            self.lines.resize(line + 1, None);
        }
        self.lines[line] = marker;
    }
}

impl MarkerBacking for PerLineMarkers {
    fn marker_at(&self, line: usize) -> Option<LineMarker> {
        self.lines.get(line).cloned().flatten()
    }

    fn remove_range(
        &mut self,
        start_line: usize,
        replaced: usize,
        inserted: usize,
        apply_shift: bool,
    ) -> Option<Vec<usize>> {
        let len = self.lines.len();
        let from = start_line.min(len);
        let to = (start_line + replaced).min(len);
        let removed: Vec<usize> = (from..to).filter(|&i| self.lines[i].is_some()).collect();
        if apply_shift {
            self.lines
                .splice(from..to, std::iter::repeat_n(None, inserted));
        } else {
            self.lines[from..to].fill(None);
        }
        while self.lines.last().is_some_and(Option::is_none) {
            self.lines.pop();
        }
        (!removed.is_empty()).then_some(removed)
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(Option::is_none)
    }
}

/// The live marker store.
#[derive(Clone, Debug, Default)]
pub enum MarkerStore {
    #[default]
    Empty,
    Sets(MarkerSets),
    PerLine(PerLineMarkers),
}

/// Tracks markers across edits.
#[derive(Clone, Debug, Default)]
pub struct MarkerTracker {
    store: MarkerStore,
}

impl MarkerTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The live store.
    #[must_use]
    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    /// Check if the tracker holds per-line markers.
    #[must_use]
    pub fn is_per_line(&self) -> bool {
        matches!(self.store, MarkerStore::PerLine(_))
    }

    fn backing(&self) -> Option<&dyn MarkerBacking> {
        match &self.store {
            MarkerStore::Empty => None,
            MarkerStore::Sets(sets) => Some(sets),
            MarkerStore::PerLine(lines) => Some(lines),
        }
    }

    fn backing_mut(&mut self) -> Option<&mut dyn MarkerBacking> {
        match &mut self.store {
            MarkerStore::Empty => None,
            MarkerStore::Sets(sets) => Some(sets),
            MarkerStore::PerLine(lines) => Some(lines),
        }
    }

    /// Decorate `[start_line, start_line + count)` with `marker`, or clear
    /// those lines when `marker` is `None`.
    ///
    /// Returns the lines that lost a marker.
    pub fn set_marker(
        &mut self,
        start_line: usize,
        count: usize,
        marker: Option<&MarkerRef>,
    ) -> Option<Vec<usize>> {
        let removed = self.remove_range(start_line, count, count, false);
        if let Some(marker) = marker {
            self.add_range(marker, start_line, count);
        }
        removed
    }

    /// Add lines to `marker`'s set, switching to set mode.
    pub fn add_range(&mut self, marker: &MarkerRef, start_line: usize, count: usize) {
        if count == 0 {
            return;
        }
        match &mut self.store {
            MarkerStore::Sets(sets) => sets.add_range(marker, start_line, count),
            store => {
                let mut sets = MarkerSets::default();
                sets.add_range(marker, start_line, count);
                *store = MarkerStore::Sets(sets);
            }
        }
    }

    /// Set the marker of one line, switching to per-line mode.
    pub fn set_line_marker(&mut self, line: usize, marker: Option<&MarkerRef>, ordinal: usize) {
        if !self.is_per_line() {
            if marker.is_none() {
                return;
            }
            self.store = MarkerStore::PerLine(PerLineMarkers::default());
        }
        if let MarkerStore::PerLine(lines) = &mut self.store {
            lines.set(
                line,
                marker.map(|marker| LineMarker {
                    marker: Arc::clone(marker),
                    ordinal,
                }),
            );
        }
    }

    /// See [`MarkerBacking::remove_range`].
    pub fn remove_range(
        &mut self,
        start_line: usize,
        replaced: usize,
        inserted: usize,
        apply_shift: bool,
    ) -> Option<Vec<usize>> {
        let removed = self
            .backing_mut()?
            .remove_range(start_line, replaced, inserted, apply_shift);
        if self.backing().is_some_and(|backing| backing.is_empty()) {
            self.store = MarkerStore::Empty;
        }
        removed
    }

    /// Shift markers for an edit replacing `replaced` lines with `inserted`.
    pub fn apply_edit(
        &mut self,
        start_line: usize,
        replaced: usize,
        inserted: usize,
    ) -> Option<Vec<usize>> {
        self.remove_range(start_line, replaced, inserted, true)
    }

    /// Marker on `line` and its ordinal.
    #[must_use]
    pub fn marker_at(&self, line: usize) -> Option<LineMarker> {
        self.backing()?.marker_at(line)
    }

    /// Lines decorated by `marker` in set mode.
    #[must_use]
    pub fn lines_of(&self, marker: &MarkerRef) -> Option<&[usize]> {
        match &self.store {
            MarkerStore::Sets(sets) => sets.lines_of(marker),
            _ => None,
        }
    }

    /// Check if no line carries a marker.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backing().is_none_or(|backing| backing.is_empty())
    }

    /// Drop every marker.
    pub fn clear(&mut self) {
        self.store = MarkerStore::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::GlyphMetrics;

    fn dot() -> MarkerRef {
        Marker::new(
            MarkerKind::Dot,
            TextStyle::with_metrics(GlyphMetrics::new(0, 0, 15)),
        )
        .shared()
    }

    #[test]
    fn test_labels() {
        let number = Marker::new(MarkerKind::Number, TextStyle::NONE).with_text(".");
        assert_eq!(number.label(0), "1.");
        assert_eq!(number.label(9), "10.");

        let lower = Marker::new(MarkerKind::LetterLower, TextStyle::NONE);
        assert_eq!(lower.label(0), "a");
        assert_eq!(lower.label(25), "z");
        assert_eq!(lower.label(26), "aa");
        let upper = Marker::new(MarkerKind::LetterUpper, TextStyle::NONE).with_text(")");
        assert_eq!(upper.label(27), "AB)");

        assert_eq!(Marker::new(MarkerKind::Dot, TextStyle::NONE).label(3), "\u{2022}");
        let text = Marker::new(MarkerKind::Text, TextStyle::NONE).with_text("-");
        assert_eq!(text.label(3), "-");
        assert_eq!(dot().width(), 15);
    }

    #[test]
    fn test_add_range_keeps_set_sorted() {
        let marker = dot();
        let mut tracker = MarkerTracker::new();
        tracker.add_range(&marker, 5, 2);
        tracker.add_range(&marker, 1, 2);
        tracker.add_range(&marker, 4, 3);
        assert_eq!(tracker.lines_of(&marker), Some(&[1, 2, 4, 5, 6][..]));

        let at = tracker.marker_at(4).unwrap();
        assert!(Arc::ptr_eq(&at.marker, &marker));
        assert_eq!(at.ordinal, 2);
        assert!(tracker.marker_at(3).is_none());
    }

    #[test]
    fn test_insert_then_remove_lines_round_trips() {
        let marker = dot();
        let mut tracker = MarkerTracker::new();
        for line in [2, 5, 7] {
            tracker.add_range(&marker, line, 1);
        }

        assert_eq!(tracker.apply_edit(5, 0, 3), None);
        assert_eq!(tracker.lines_of(&marker), Some(&[2, 8, 10][..]));

        assert_eq!(tracker.apply_edit(5, 3, 0), None);
        assert_eq!(tracker.lines_of(&marker), Some(&[2, 5, 7][..]));
    }

    #[test]
    fn test_remove_range_reports_removed_lines() {
        let marker = dot();
        let mut tracker = MarkerTracker::new();
        tracker.add_range(&marker, 0, 10);
        let removed = tracker.remove_range(3, 4, 1, true);
        assert_eq!(removed, Some(vec![3, 4, 5, 6]));
        assert_eq!(tracker.lines_of(&marker), Some(&[0, 1, 2, 4, 5, 6][..]));

        assert_eq!(tracker.remove_range(0, 7, 0, false), Some(vec![0, 1, 2, 4, 5, 6]));
        assert!(tracker.is_empty());
        assert!(matches!(tracker.store(), MarkerStore::Empty));
    }

    #[test]
    fn test_set_marker_replaces_other_markers() {
        let first = dot();
        let second = dot();
        let mut tracker = MarkerTracker::new();
        tracker.set_marker(0, 4, Some(&first));
        let removed = tracker.set_marker(2, 4, Some(&second));
        assert_eq!(removed, Some(vec![2, 3]));
        assert_eq!(tracker.lines_of(&first), Some(&[0, 1][..]));
        assert_eq!(tracker.lines_of(&second), Some(&[2, 3, 4, 5][..]));

        tracker.set_marker(0, 2, None);
        assert!(tracker.lines_of(&first).is_none());
        assert_eq!(tracker.marker_at(3).map(|m| m.ordinal), Some(1));
    }

    #[test]
    fn test_per_line_mode_is_exclusive() {
        let marker = dot();
        let mut tracker = MarkerTracker::new();
        tracker.add_range(&marker, 0, 3);

        tracker.set_line_marker(5, Some(&marker), 7);
        assert!(tracker.is_per_line());
        assert!(tracker.marker_at(0).is_none());
        assert_eq!(tracker.marker_at(5).map(|m| m.ordinal), Some(7));

        // Two lines inserted above shift the per-line entry.
        tracker.apply_edit(1, 0, 2);
        assert!(tracker.marker_at(5).is_none());
        assert_eq!(tracker.marker_at(7).map(|m| m.label()), Some("\u{2022}".to_string()));

        // A set-mode write discards the per-line store.
        tracker.add_range(&marker, 0, 1);
        assert!(!tracker.is_per_line());
        assert!(tracker.marker_at(7).is_none());
    }
}
