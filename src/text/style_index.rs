//! Interval index mapping disjoint char ranges to text styles.
//!
//! Entries are kept in two parallel vectors, one holding `(start, len)` spans
//! and one holding the interned style of each span. All lookups are binary
//! searches over the span vector.
//!
//! Invariants maintained after every public operation:
//!
//! - spans are non-empty, ascending and non-overlapping
//! - two touching spans never carry similar styles
//! - no two distinct `Arc`s in the index hold similar styles
//!
//! # Examples
//!
//! ```
//! use styledtext_rust::{StyleIndex, TextStyle};
//!
//! let mut index = StyleIndex::new();
//! index.assign(0, 5, &TextStyle::bold());
//! index.assign(6, 5, &TextStyle::bold());
//! assert_eq!(index.len(), 2);
//!
//! // Filling the gap merges all three into one entry.
//! index.assign(5, 1, &TextStyle::bold());
//! assert_eq!(index.len(), 1);
//! assert_eq!(index.query(0, 11)[0].length, 11);
//! ```

use super::style_range::{StyleRange, StyleRun};
use crate::style::TextStyle;
use std::collections::HashSet;
use std::sync::Arc;

/// What happens to text inserted strictly inside a styled entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertPolicy {
    /// The entry is split and the inserted text is unstyled.
    #[default]
    Plain,
    /// The entry grows to cover the inserted text.
    Inherit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Span {
    start: usize,
    len: usize,
}

impl Span {
    fn end(self) -> usize {
        self.start + self.len
    }
}

/// Deduplicates style instances so similar styles share one `Arc`.
#[derive(Clone, Debug, Default)]
struct StyleInterner {
    styles: HashSet<Arc<TextStyle>>,
}

impl StyleInterner {
    fn intern(&mut self, style: &TextStyle) -> Arc<TextStyle> {
        if let Some(existing) = self.styles.get(style) {
            return Arc::clone(existing);
        }
        let style = Arc::new(style.clone());
        self.styles.insert(Arc::clone(&style));
        style
    }

    /// Drop styles only the interner still references.
    fn prune(&mut self) {
        self.styles.retain(|style| Arc::strong_count(style) > 1);
    }

    fn len(&self) -> usize {
        self.styles.len()
    }

    fn clear(&mut self) {
        self.styles.clear();
    }
}

fn same_style(a: &Arc<TextStyle>, b: &Arc<TextStyle>) -> bool {
    Arc::ptr_eq(a, b) || a.similar_to(b)
}

/// Ordered, merged, interned set of styled char ranges.
#[derive(Clone, Debug, Default)]
pub struct StyleIndex {
    spans: Vec<Span>,
    styles: Vec<Arc<TextStyle>>,
    interner: StyleInterner,
}

impl StyleIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Check if no range is styled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Number of distinct style instances currently interned.
    #[must_use]
    pub fn distinct_styles(&self) -> usize {
        self.interner.len()
    }

    /// Style `[start, start + length)`, overriding earlier assignments.
    ///
    /// An unstyled `style` clears the range instead.
    pub fn assign(&mut self, start: usize, length: usize, style: &TextStyle) {
        if length == 0 {
            return;
        }
        if style.is_unstyled() {
            self.remove(start, length);
            return;
        }
        let at = self.clear_span(start, start + length);
        let style = self.interner.intern(style);
        self.spans.insert(at, Span { start, len: length });
        self.styles.insert(at, style);
        self.coalesce_around(at);
        self.prune_if_needed();
    }

    /// Apply several assignments in order; later ranges win.
    pub fn assign_all(&mut self, ranges: &[StyleRange]) {
        for range in ranges {
            self.assign(range.start, range.length, &range.style);
        }
    }

    /// Replace the whole index.
    pub fn set_ranges(&mut self, ranges: Vec<StyleRange>) {
        self.clear();
        self.assign_all(&ranges);
    }

    /// Clear `[start, start + length)` and assign `ranges` clipped to it.
    pub fn replace(&mut self, start: usize, length: usize, ranges: &[StyleRange]) {
        let end = start + length;
        self.remove(start, length);
        for range in ranges {
            let from = range.start.max(start);
            let to = range.end().min(end);
            if from < to {
                self.assign(from, to - from, &range.style);
            }
        }
    }

    /// Remove styling from `[start, start + length)`.
    pub fn remove(&mut self, start: usize, length: usize) {
        if length == 0 {
            return;
        }
        self.clear_span(start, start + length);
        self.prune_if_needed();
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.spans.clear();
        self.styles.clear();
        self.interner.clear();
    }

    /// Styled entries overlapping the window, clipped to it.
    #[must_use]
    pub fn query(&self, start: usize, length: usize) -> Vec<StyleRange> {
        if length == 0 {
            return Vec::new();
        }
        let end = start + length;
        let first = self.first_ending_after(start);
        self.spans[first..]
            .iter()
            .zip(&self.styles[first..])
            .take_while(|(span, _)| span.start < end)
            .map(|(span, style)| {
                let from = span.start.max(start);
                let to = span.end().min(end);
                StyleRange::shared(from, to - from, Arc::clone(style))
            })
            .collect()
    }

    /// Runs tiling the window exactly, with `None` for unstyled gaps.
    #[must_use]
    pub fn runs(&self, start: usize, length: usize) -> Vec<StyleRun> {
        let end = start + length;
        let mut runs = Vec::new();
        let mut cursor = start;
        for range in self.query(start, length) {
            if range.start > cursor {
                runs.push(StyleRun {
                    range: cursor..range.start,
                    style: None,
                });
            }
            cursor = range.end();
            runs.push(StyleRun {
                range: range.range(),
                style: Some(range.style),
            });
        }
        if cursor < end {
            runs.push(StyleRun {
                range: cursor..end,
                style: None,
            });
        }
        runs
    }

    /// Style of the char at `offset`, if any.
    #[must_use]
    pub fn style_at(&self, offset: usize) -> Option<&Arc<TextStyle>> {
        let i = self.first_ending_after(offset);
        match self.spans.get(i) {
            Some(span) if span.start <= offset => self.styles.get(i),
            _ => None,
        }
    }

    /// Iterate over all entries in order.
    pub fn iter(&self) -> impl Iterator<Item = StyleRange> + '_ {
        self.spans
            .iter()
            .zip(&self.styles)
            .map(|(span, style)| StyleRange::shared(span.start, span.len, Arc::clone(style)))
    }

    /// Check if any entry is a hyperlink.
    #[must_use]
    pub fn has_links(&self) -> bool {
        self.styles.iter().any(|style| style.is_link())
    }

    /// Check if any style overlapping the window changes line height.
    #[must_use]
    pub fn has_variable_height(&self, start: usize, length: usize) -> bool {
        if length == 0 {
            return false;
        }
        let end = start + length;
        let first = self.first_ending_after(start);
        self.spans[first..]
            .iter()
            .zip(&self.styles[first..])
            .take_while(|(span, _)| span.start < end)
            .any(|(_, style)| style.is_variable_height())
    }

    /// Shift entries for a replacement of `removed` chars at `edit_start` by
    /// `inserted` new chars.
    pub fn shift_on_edit(
        &mut self,
        edit_start: usize,
        removed: usize,
        inserted: usize,
        policy: InsertPolicy,
    ) {
        if removed == 0 && inserted == 0 {
            return;
        }
        let edit_end = edit_start + removed;
        let i = self.first_ending_after(edit_start);

        if let Some(&span) = self.spans.get(i) {
            if span.start < edit_start && edit_end < span.end() {
                let shift_from = if inserted == 0 || policy == InsertPolicy::Inherit {
                    self.spans[i].len = span.len - removed + inserted;
                    i + 1
                } else {
                    let tail = Span {
                        start: edit_start + inserted,
                        len: span.end() - edit_end,
                    };
                    self.spans[i].len = edit_start - span.start;
                    let style = Arc::clone(&self.styles[i]);
                    self.spans.insert(i + 1, tail);
                    self.styles.insert(i + 1, style);
                    i + 2
                };
                self.shift_from(shift_from, removed, inserted);
                return;
            }
        }

        let at = self.clear_span(edit_start, edit_end);
        self.shift_from(at, removed, inserted);
        if at > 0 && at < self.spans.len() {
            self.try_merge(at - 1);
        }
        self.prune_if_needed();
    }

    /// Check the ordering and merge invariants.
    #[doc(hidden)]
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.spans.len() == self.styles.len()
            && self.spans.iter().all(|span| span.len > 0)
            && self.spans.windows(2).zip(self.styles.windows(2)).all(|(s, st)| {
                s[0].end() <= s[1].start && !(s[0].end() == s[1].start && same_style(&st[0], &st[1]))
            })
    }

    /// Index of the first span whose end is past `offset`.
    fn first_ending_after(&self, offset: usize) -> usize {
        self.spans.partition_point(|span| span.end() <= offset)
    }

    /// Unstyle `[start, end)`, splitting boundary entries.
    ///
    /// Returns the position where an entry starting at `start` belongs.
    fn clear_span(&mut self, start: usize, end: usize) -> usize {
        let first = self.first_ending_after(start);
        let last = self.spans.partition_point(|span| span.start < end);
        if first >= last {
            return first;
        }

        let mut spans = Vec::with_capacity(2);
        let mut styles = Vec::with_capacity(2);
        let head = self.spans[first];
        if head.start < start {
            spans.push(Span {
                start: head.start,
                len: start - head.start,
            });
            styles.push(Arc::clone(&self.styles[first]));
        }
        let at = first + spans.len();
        let tail = self.spans[last - 1];
        if tail.end() > end {
            spans.push(Span {
                start: end,
                len: tail.end() - end,
            });
            styles.push(Arc::clone(&self.styles[last - 1]));
        }

        self.spans.splice(first..last, spans);
        self.styles.splice(first..last, styles);
        at
    }

    fn shift_from(&mut self, from: usize, removed: usize, inserted: usize) {
        for span in &mut self.spans[from..] {
            span.start = span.start - removed + inserted;
        }
    }

    fn coalesce_around(&mut self, index: usize) {
        if index + 1 < self.spans.len() {
            self.try_merge(index);
        }
        if index > 0 && index < self.spans.len() {
            self.try_merge(index - 1);
        }
    }

    /// Merge entry `i` with `i + 1` if they touch and look the same.
    fn try_merge(&mut self, i: usize) -> bool {
        let (a, b) = (self.spans[i], self.spans[i + 1]);
        if a.end() != b.start || !same_style(&self.styles[i], &self.styles[i + 1]) {
            return false;
        }
        self.spans[i].len += b.len;
        self.spans.remove(i + 1);
        self.styles.remove(i + 1);
        true
    }

    fn prune_if_needed(&mut self) {
        if self.interner.len() > self.styles.len() {
            self.interner.prune();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    fn dump(index: &StyleIndex) -> Vec<(usize, usize, bool)> {
        index
            .iter()
            .map(|r| (r.start, r.length, r.style.font_style.contains(crate::style::FontStyle::BOLD)))
            .collect()
    }

    #[test]
    fn test_assign_merges_touching_similar() {
        let mut index = StyleIndex::new();
        index.assign(0, 5, &TextStyle::bold());
        index.assign(6, 5, &TextStyle::bold());
        assert_eq!(dump(&index), vec![(0, 5, true), (6, 5, true)]);

        index.assign(5, 1, &TextStyle::bold());
        assert_eq!(dump(&index), vec![(0, 11, true)]);
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_assign_splits_and_overrides() {
        let mut index = StyleIndex::new();
        index.assign(0, 10, &TextStyle::bold());
        index.assign(3, 4, &TextStyle::italic());

        let ranges = index.query(0, 10);
        assert_eq!(ranges.len(), 3);
        assert_eq!((ranges[0].start, ranges[0].length), (0, 3));
        assert_eq!((ranges[1].start, ranges[1].length), (3, 4));
        assert_eq!(*ranges[1].style, TextStyle::italic());
        assert_eq!((ranges[2].start, ranges[2].length), (7, 3));
        // Both bold halves share the same interned instance.
        assert!(Arc::ptr_eq(&ranges[0].style, &ranges[2].style));
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_assign_spanning_several_entries() {
        let mut index = StyleIndex::new();
        index.assign(0, 2, &TextStyle::bold());
        index.assign(4, 2, &TextStyle::italic());
        index.assign(8, 2, &TextStyle::fg(Rgba::RED));
        index.assign(1, 8, &TextStyle::bg(Rgba::BLUE));

        let spans: Vec<_> = index.iter().map(|r| (r.start, r.length)).collect();
        assert_eq!(spans, vec![(0, 1), (1, 8), (9, 1)]);
        assert_eq!(index.distinct_styles(), 3);
    }

    #[test]
    fn test_unstyled_assignment_clears() {
        let mut index = StyleIndex::new();
        index.assign(0, 10, &TextStyle::bold());
        index.assign(2, 3, &TextStyle::NONE);
        assert_eq!(dump(&index), vec![(0, 2, true), (5, 5, true)]);
        index.assign(0, 0, &TextStyle::italic());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_query_clips_and_runs_fill_gaps() {
        let mut index = StyleIndex::new();
        index.assign(2, 4, &TextStyle::bold());
        index.assign(8, 2, &TextStyle::italic());

        let ranges = index.query(3, 6);
        assert_eq!(
            ranges.iter().map(|r| (r.start, r.length)).collect::<Vec<_>>(),
            vec![(3, 3), (8, 1)]
        );
        assert!(index.query(6, 2).is_empty());
        assert!(index.query(3, 0).is_empty());

        let runs = index.runs(0, 12);
        let bounds: Vec<_> = runs.iter().map(|r| (r.range.clone(), r.style.is_some())).collect();
        assert_eq!(
            bounds,
            vec![
                (0..2, false),
                (2..6, true),
                (6..8, false),
                (8..10, true),
                (10..12, false),
            ]
        );
    }

    #[test]
    fn test_style_at() {
        let mut index = StyleIndex::new();
        index.assign(4, 2, &TextStyle::bold());
        assert!(index.style_at(3).is_none());
        assert_eq!(**index.style_at(4).unwrap(), TextStyle::bold());
        assert!(index.style_at(5).is_some());
        assert!(index.style_at(6).is_none());
    }

    #[test]
    fn test_replace_clears_then_assigns() {
        let mut index = StyleIndex::new();
        index.assign(0, 20, &TextStyle::bold());
        index.replace(
            5,
            10,
            &[
                StyleRange::new(0, 8, TextStyle::italic()),
                StyleRange::new(12, 2, TextStyle::fg(Rgba::GREEN)),
            ],
        );
        let spans: Vec<_> = index.iter().map(|r| (r.start, r.length)).collect();
        assert_eq!(spans, vec![(0, 5), (5, 3), (12, 2), (15, 5)]);
    }

    #[test]
    fn test_set_ranges_later_wins() {
        let mut index = StyleIndex::new();
        index.assign(100, 1, &TextStyle::bold());
        index.set_ranges(vec![
            StyleRange::new(0, 10, TextStyle::bold()),
            StyleRange::new(5, 10, TextStyle::italic()),
        ]);
        let spans: Vec<_> = index.iter().map(|r| (r.start, r.length)).collect();
        assert_eq!(spans, vec![(0, 5), (5, 10)]);
    }

    #[test]
    fn test_interner_prunes_dead_styles() {
        let mut index = StyleIndex::new();
        index.assign(0, 5, &TextStyle::bold());
        index.assign(0, 5, &TextStyle::italic());
        assert_eq!(index.distinct_styles(), 1);
        index.clear();
        assert_eq!(index.distinct_styles(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_insert_inside_entry_plain() {
        let mut index = StyleIndex::new();
        index.assign(0, 10, &TextStyle::bold());
        index.shift_on_edit(4, 0, 3, InsertPolicy::Plain);
        assert_eq!(dump(&index), vec![(0, 4, true), (7, 6, true)]);
    }

    #[test]
    fn test_insert_inside_entry_inherit() {
        let mut index = StyleIndex::new();
        index.assign(0, 10, &TextStyle::bold());
        index.assign(20, 2, &TextStyle::bold());
        index.shift_on_edit(4, 0, 3, InsertPolicy::Inherit);
        assert_eq!(dump(&index), vec![(0, 13, true), (23, 2, true)]);
    }

    #[test]
    fn test_delete_inside_entry_shrinks() {
        let mut index = StyleIndex::new();
        index.assign(0, 10, &TextStyle::bold());
        index.assign(12, 3, &TextStyle::italic());
        index.shift_on_edit(2, 5, 0, InsertPolicy::Plain);
        let spans: Vec<_> = index.iter().map(|r| (r.start, r.length)).collect();
        assert_eq!(spans, vec![(0, 5), (7, 3)]);
    }

    #[test]
    fn test_insert_at_boundaries_is_plain() {
        let mut index = StyleIndex::new();
        index.assign(5, 5, &TextStyle::bold());
        index.shift_on_edit(5, 0, 2, InsertPolicy::Inherit);
        assert_eq!(dump(&index), vec![(7, 5, true)]);
        index.shift_on_edit(12, 0, 2, InsertPolicy::Inherit);
        assert_eq!(dump(&index), vec![(7, 5, true)]);
    }

    #[test]
    fn test_delete_across_entries_truncates_and_merges() {
        let mut index = StyleIndex::new();
        index.assign(0, 4, &TextStyle::bold());
        index.assign(4, 2, &TextStyle::italic());
        index.assign(6, 4, &TextStyle::bold());
        // Removing chars 2..8 deletes the italic entry and joins the bold ends.
        index.shift_on_edit(2, 6, 0, InsertPolicy::Plain);
        assert_eq!(dump(&index), vec![(0, 4, true)]);
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_replace_across_entries_keeps_inserted_plain() {
        let mut index = StyleIndex::new();
        index.assign(0, 4, &TextStyle::bold());
        index.assign(6, 4, &TextStyle::bold());
        index.shift_on_edit(2, 6, 1, InsertPolicy::Plain);
        assert_eq!(dump(&index), vec![(0, 2, true), (3, 2, true)]);
    }

    #[test]
    fn test_variable_height_and_links() {
        let mut index = StyleIndex::new();
        index.assign(0, 3, &TextStyle::bold());
        index.assign(10, 3, &TextStyle::NONE.with_rise(2));
        assert!(!index.has_variable_height(0, 5));
        assert!(index.has_variable_height(8, 3));
        assert!(!index.has_links());
        index.assign(20, 1, &TextStyle::underline(crate::style::UnderlineStyle::Link));
        assert!(index.has_links());
    }
}
