//! Sparse per-line paragraph formatting.

use super::shaper::Alignment;
use crate::color::Rgba;
use std::ops::Range;

/// Paragraph attributes of one line. Unset fields use the renderer defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineFormat {
    pub alignment: Option<Alignment>,
    pub indent: Option<u32>,
    pub wrap_indent: Option<u32>,
    pub vertical_indent: Option<u32>,
    pub justify: Option<bool>,
    pub tab_stops: Option<Vec<u32>>,
    pub background: Option<Rgba>,
}

impl LineFormat {
    /// Check if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Line formats indexed by line, shifted with line edits.
#[derive(Clone, Debug, Default)]
pub struct LineFormats {
    lines: Vec<Option<LineFormat>>,
}

impl LineFormats {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format of `line`, if any attribute is set.
    #[must_use]
    pub fn get(&self, line: usize) -> Option<&LineFormat> {
        self.lines.get(line)?.as_ref()
    }

    /// Check if no line has a format.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(Option::is_none)
    }

    /// Apply `update` to every line in `lines`.
    pub fn update<F>(&mut self, lines: Range<usize>, mut update: F)
    where
        F: FnMut(&mut LineFormat),
    {
        if lines.is_empty() {
            return;
        }
        if self.lines.len() < lines.end {
            self.lines.resize(lines.end, None);
        }
        for slot in &mut self.lines[lines] {
            let format = slot.get_or_insert_with(LineFormat::default);
            update(format);
            if format.is_empty() {
                *slot = None;
            }
        }
        self.trim();
    }

    /// Remove the formats of `replaced` lines at `start_line` and open
    /// `inserted` unformatted lines in their place.
    pub fn apply_edit(&mut self, start_line: usize, replaced: usize, inserted: usize) {
        let len = self.lines.len();
        if start_line >= len {
            return;
        }
        let end = (start_line + replaced).min(len);
        self.lines
            .splice(start_line..end, std::iter::repeat_n(None, inserted));
        self.trim();
    }

    /// Drop every format.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn trim(&mut self) {
        while self.lines.last().is_some_and(Option::is_none) {
            self.lines.pop();
        }
    }
}
